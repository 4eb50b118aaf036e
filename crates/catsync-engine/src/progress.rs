//! Resumable progress through a supplier's grouped products.

use crate::error::StateError;
use crate::state::StateStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressState {
    NotStarted,
    InProgress { cursor: String },
    Completed,
}

/// Tracks the last fully processed grouping key.
///
/// When disabled (suppliers with `resumable: false`) nothing is read or
/// written and every run starts from the first product.
#[derive(Debug)]
pub struct ProgressTracker<S> {
    store: S,
    enabled: bool,
    state: ProgressState,
}

impl<S: StateStore> ProgressTracker<S> {
    /// # Errors
    ///
    /// Returns [`StateError`] when the stored cursor cannot be read.
    pub fn load(store: S, enabled: bool) -> Result<Self, StateError> {
        let state = if enabled {
            match store.load_cursor()? {
                Some(cursor) => ProgressState::InProgress { cursor },
                None => ProgressState::NotStarted,
            }
        } else {
            ProgressState::NotStarted
        };
        Ok(Self {
            store,
            enabled,
            state,
        })
    }

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        match &self.state {
            ProgressState::InProgress { cursor } => Some(cursor),
            _ => None,
        }
    }

    /// Index of the first product to process.
    ///
    /// Products up to and including the cursor are skipped. A cursor that no
    /// longer appears in the feed restarts from the beginning.
    #[must_use]
    pub fn resume_position<'a, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(cursor) = self.cursor() else {
            return 0;
        };
        if let Some(pos) = keys.into_iter().position(|k| k == cursor) {
            pos + 1
        } else {
            tracing::warn!(
                cursor,
                "progress cursor not found in feed; starting from the beginning"
            );
            0
        }
    }

    /// Commits `grouping_key` as fully processed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the cursor cannot be persisted.
    pub fn advance(&mut self, grouping_key: &str) -> Result<(), StateError> {
        if self.enabled {
            self.store.save_cursor(grouping_key)?;
        }
        self.state = ProgressState::InProgress {
            cursor: grouping_key.to_string(),
        };
        Ok(())
    }

    /// Marks the run complete and deletes the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the cursor cannot be removed.
    pub fn complete(&mut self) -> Result<(), StateError> {
        if self.enabled {
            self.store.clear_cursor()?;
        }
        self.state = ProgressState::Completed;
        Ok(())
    }
}
