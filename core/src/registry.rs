use crate::error::{IndexError, Result};
use crate::index::ReverseIndex;
use crate::tokenizer::TokenizerConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Named collections, each with its own reverse index.
///
/// Constructed once at startup and shared with the transport layer. The map
/// lock is only held long enough to find or insert an `Arc`, so work on one
/// collection never waits on another collection's index lock.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    config: TokenizerConfig,
    indices: RwLock<HashMap<String, Arc<ReverseIndex>>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every index created by this registry tokenizes with `config`.
    pub fn with_config(config: TokenizerConfig) -> Self {
        Self { config, indices: RwLock::new(HashMap::new()) }
    }

    /// Return the index for `name`, creating and registering it if absent.
    pub fn get_or_create(&self, name: &str) -> Arc<ReverseIndex> {
        if let Some(index) = self.indices.read().get(name) {
            return Arc::clone(index);
        }
        let mut indices = self.indices.write();
        // Another writer may have won the race between the two guards.
        let index = indices.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(collection = name, "creating reverse index");
            Arc::new(ReverseIndex::with_config(name, self.config.clone()))
        });
        Arc::clone(index)
    }

    pub fn get(&self, name: &str) -> Result<Arc<ReverseIndex>> {
        self.indices
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| IndexError::CollectionNotFound(name.to_string()))
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.indices.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.indices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.read().is_empty()
    }
}
