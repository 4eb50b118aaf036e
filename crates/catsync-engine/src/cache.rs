//! The image sync cache: the only record of which images were already sent.

use std::collections::BTreeMap;

use crate::canonical::CanonicalImageKey;
use crate::error::StateError;
use crate::state::{CacheEntry, StateStore, ValidationResult};

/// Image cache loaded once per run and written back after every mutation.
///
/// Entries are only ever added or upgraded, never removed. Not safe for
/// concurrent runs against the same store.
#[derive(Debug)]
pub struct SyncCache<S> {
    store: S,
    entries: BTreeMap<String, CacheEntry>,
}

impl<S: StateStore> SyncCache<S> {
    /// # Errors
    ///
    /// Returns [`StateError`] when the store cannot be read.
    pub fn load(store: S) -> Result<Self, StateError> {
        let entries = store.load_entries()?;
        tracing::debug!(entries = entries.len(), "loaded image cache");
        Ok(Self { store, entries })
    }

    /// `false` only when the image has been uploaded before.
    #[must_use]
    pub fn should_upload(&self, key: &CanonicalImageKey) -> bool {
        !self.entries.get(key.as_str()).is_some_and(|e| e.uploaded)
    }

    /// Records a successful upload and persists the cache.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the cache cannot be persisted.
    pub fn mark_uploaded(
        &mut self,
        key: &CanonicalImageKey,
        remote_id: Option<u64>,
    ) -> Result<(), StateError> {
        let entry = self.entries.entry(key.as_str().to_string()).or_default();
        entry.uploaded = true;
        if remote_id.is_some() {
            entry.remote_id = remote_id;
        }
        self.persist()
    }

    #[must_use]
    pub fn remote_id(&self, key: &CanonicalImageKey) -> Option<u64> {
        self.entries.get(key.as_str()).and_then(|e| e.remote_id)
    }

    #[must_use]
    pub fn validation(&self, key: &CanonicalImageKey) -> Option<&ValidationResult> {
        self.entries
            .get(key.as_str())
            .and_then(|e| e.validation.as_ref())
    }

    /// Stores the validator's verdict and persists the cache.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the cache cannot be persisted.
    pub fn record_validation(
        &mut self,
        key: &CanonicalImageKey,
        result: ValidationResult,
    ) -> Result<(), StateError> {
        self.entries
            .entry(key.as_str().to_string())
            .or_default()
            .validation = Some(result);
        self.persist()
    }

    /// # Errors
    ///
    /// Returns [`StateError`] when the store rejects the write.
    pub fn persist(&self) -> Result<(), StateError> {
        self.store.save_entries(&self.entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn uploaded_count(&self) -> usize {
        self.entries.values().filter(|e| e.uploaded).count()
    }
}
