use crate::error::{IndexError, Result};
use crate::tokenizer::{group_positions, tokenize, TokenizerConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How many times a word occurs inside the one document a posting describes.
pub type OccurrenceCount = usize;

/// Postings for one word, bucketed by occurrence count.
pub type PostingsByCount = BTreeMap<OccurrenceCount, Vec<Posting>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub document_name: String,
    /// Token start offsets, ascending.
    pub char_positions: Vec<usize>,
}

#[derive(Default)]
struct IndexState {
    words: HashMap<String, PostingsByCount>,
    documents: HashMap<String, String>,
}

/// Word-level reverse index over one named collection of documents.
///
/// Postings are append-only: loading a document name a second time adds new
/// entries next to the old ones instead of replacing them, while the stored
/// text for that name is overwritten.
pub struct ReverseIndex {
    name: String,
    config: TokenizerConfig,
    state: RwLock<IndexState>,
}

impl ReverseIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, TokenizerConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: TokenizerConfig) -> Self {
        Self { name: name.into(), config, state: RwLock::new(IndexState::default()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize `text` and merge one posting per distinct word into the bucket
    /// matching that word's count in this document, then store the text.
    pub fn ingest(&self, document_name: &str, text: &str) -> Result<()> {
        // Scan outside the lock; only the merge needs exclusive access.
        let grouped = group_positions(tokenize(text, &self.config));
        let distinct_words = grouped.len();

        let mut state = self.state.write();
        for (word, positions) in grouped {
            let count = positions.len();
            state
                .words
                .entry(word)
                .or_default()
                .entry(count)
                .or_default()
                .push(Posting { document_name: document_name.to_string(), char_positions: positions });
        }
        state.documents.insert(document_name.to_string(), text.to_string());
        drop(state);

        tracing::debug!(index = %self.name, document = document_name, distinct_words, "ingested document");
        Ok(())
    }

    /// Exact, case-sensitive lookup. The query word is not normalized.
    pub fn lookup(&self, word: &str) -> Result<PostingsByCount> {
        self.state
            .read()
            .words
            .get(word)
            .cloned()
            .ok_or_else(|| IndexError::WordNotIndexed(word.to_string()))
    }

    /// Stored document names in no particular order.
    pub fn list_document_names(&self) -> Vec<String> {
        self.state.read().documents.keys().cloned().collect()
    }

    pub fn dump_documents(&self) -> HashMap<String, String> {
        self.state.read().documents.clone()
    }

    pub fn document_count(&self) -> usize {
        self.state.read().documents.len()
    }

    pub fn word_count(&self) -> usize {
        self.state.read().words.len()
    }
}

impl std::fmt::Debug for ReverseIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReverseIndex")
            .field("name", &self.name)
            .field("documents", &self.document_count())
            .field("words", &self.word_count())
            .finish()
    }
}
