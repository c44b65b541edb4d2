//! The note index: every note record, persisted as one JSON array under a
//! single key of a [`KeyValueStore`].

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::note::Note;
use crate::storage::KeyValueStore;

/// Default key the index is stored under.
pub const DEFAULT_INDEX_KEY: &str = "@camera_notes";

/// Durable ordered list of [`Note`]s.
///
/// There are no partial updates: callers load the full list, modify it and
/// save it back.
#[derive(Debug, Clone)]
pub struct NoteIndex {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl NoteIndex {
    /// Create an index stored under [`DEFAULT_INDEX_KEY`].
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_INDEX_KEY)
    }

    /// Create an index stored under a custom key.
    #[must_use]
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The key this index is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read every note in stored order.
    ///
    /// A key that has never been written loads as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexCorrupt`] if the stored value is not a list of
    /// well-formed note records, or a storage error if the read fails.
    pub async fn load(&self) -> Result<Vec<Note>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            debug!("No index stored under {}, starting empty", self.key);
            return Ok(Vec::new());
        };

        let notes: Vec<Note> =
            serde_json::from_str(&raw).map_err(|source| Error::IndexCorrupt {
                key: self.key.clone(),
                source,
            })?;
        debug!("Loaded {} notes from {}", notes.len(), self.key);
        Ok(notes)
    }

    /// Replace the stored list with `notes`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails; the previously stored
    /// list is then left unchanged.
    pub async fn save(&self, notes: &[Note]) -> Result<()> {
        let raw = serde_json::to_string(notes)?;
        self.store.set(&self.key, &raw).await.map_err(|e| {
            error!("Failed to save note index under {}: {}", self.key, e);
            e
        })?;
        debug!("Saved {} notes to {}", notes.len(), self.key);
        Ok(())
    }
}
