pub mod error;
pub mod index;
pub mod registry;
pub mod tokenizer;

pub use error::{IndexError, Result};
pub use index::{OccurrenceCount, Posting, PostingsByCount, ReverseIndex};
pub use registry::IndexRegistry;
pub use tokenizer::{tokenize, Token, TokenizerConfig, DEFAULT_TRIM_CHARS};
