use thiserror::Error;

/// Errors surfaced by the index and the registry in front of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("collection {0} does not exist")]
    CollectionNotFound(String),

    #[error("word {0} has not yet been indexed")]
    WordNotIndexed(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// True when the error means the requested collection or word is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::CollectionNotFound(_) | IndexError::WordNotIndexed(_))
    }
}
