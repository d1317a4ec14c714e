use std::sync::Arc;

use tracing::{debug, info, warn};

use pathstate_store::SessionStore;
use pathstate_types::Tree;

use crate::config::PersistConfig;
use crate::error::PersistResult;

/// Reads and writes versioned snapshots of a state tree.
///
/// `load` never fails: a disabled adapter, a version mismatch, an absent or
/// empty entry, unparsable JSON and store errors all yield the redacted
/// initial state.
pub struct Persistence {
    config: PersistConfig,
    store: Arc<dyn SessionStore>,
}

impl Persistence {
    /// Create an adapter over `store`.
    pub fn new(config: PersistConfig, store: Arc<dyn SessionStore>) -> Self {
        Self { config, store }
    }

    /// The adapter's configuration.
    pub fn config(&self) -> &PersistConfig {
        &self.config
    }

    /// Whether snapshots are read and written at all.
    pub fn is_enabled(&self) -> bool {
        self.config.persist
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Load the snapshot to start from.
    pub fn load(&self, initial: &Tree) -> Tree {
        let fallback = (self.config.replacer)(initial.clone());
        if !self.config.persist {
            return fallback;
        }

        match self.store.get_item(&self.config.keys.version) {
            Ok(stored) if stored == self.config.version => {}
            Ok(stored) => {
                info!(
                    stored = ?stored,
                    running = ?self.config.version,
                    "schema version changed, discarding persisted state"
                );
                if let Err(e) = self.reset(&fallback) {
                    warn!(error = %e, "failed to reset persisted state");
                }
                return fallback;
            }
            Err(e) => {
                warn!(error = %e, "failed to read persisted version");
                return fallback;
            }
        }

        match self.read_state() {
            Ok(Some(tree)) => {
                debug!(key = %self.config.keys.state, "persisted state restored");
                (self.config.reviver)(tree)
            }
            Ok(None) => fallback,
            Err(e) => {
                warn!(error = %e, "persisted state unreadable, using initial state");
                fallback
            }
        }
    }

    /// Redact `tree` and write it to the store immediately.
    pub fn write(&self, tree: &Tree) -> PersistResult<()> {
        let redacted = (self.config.replacer)(tree.clone());
        self.write_redacted(&redacted)
    }

    /// Remove both entries from the store.
    pub fn discard(&self) -> PersistResult<()> {
        self.store.remove_item(&self.config.keys.state)?;
        self.store.remove_item(&self.config.keys.version)?;
        Ok(())
    }

    fn read_state(&self) -> PersistResult<Option<Tree>> {
        let Some(text) = self.store.get_item(&self.config.keys.state)? else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn reset(&self, redacted: &Tree) -> PersistResult<()> {
        self.write_redacted(redacted)?;
        match &self.config.version {
            Some(version) => self.store.set_item(&self.config.keys.version, version)?,
            None => {
                self.store.remove_item(&self.config.keys.version)?;
            }
        }
        Ok(())
    }

    fn write_redacted(&self, redacted: &Tree) -> PersistResult<()> {
        let text = serde_json::to_string(redacted)?;
        self.store.set_item(&self.config.keys.state, &text)?;
        debug!(key = %self.config.keys.state, bytes = text.len(), "state persisted");
        Ok(())
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
