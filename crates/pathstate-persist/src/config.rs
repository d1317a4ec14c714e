use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pathstate_types::Tree;

/// Namespace used for store keys when none is configured.
pub const DEFAULT_NAMESPACE: &str = "pathstate";

/// A tree-to-tree transform applied before writing (replacer) or after
/// reading (reviver) a snapshot.
pub type Redactor = Arc<dyn Fn(Tree) -> Tree + Send + Sync>;

/// The redactor that changes nothing.
pub fn identity() -> Redactor {
    Arc::new(|tree: Tree| tree)
}

/// Names of the two store entries used by one container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    /// Entry holding the JSON text of the redacted tree.
    pub state: String,
    /// Entry holding the schema version tag.
    pub version: String,
}

impl StorageKeys {
    /// Keys `"<namespace>-state"` and `"<namespace>-version"`.
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            state: format!("{namespace}-state"),
            version: format!("{namespace}-version"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::for_namespace(DEFAULT_NAMESPACE)
    }
}

/// Configuration for the persistence adapter.
#[derive(Clone)]
pub struct PersistConfig {
    /// When `false`, nothing is read from or written to the store.
    pub persist: bool,
    /// Schema tag; a stored snapshot with a different tag is discarded.
    pub version: Option<String>,
    /// Applied to the tree before it is written.
    pub replacer: Redactor,
    /// Applied to a tree after it is read.
    pub reviver: Redactor,
    /// Minimum spacing between physical writes.
    pub throttle: Duration,
    /// Store entry names.
    pub keys: StorageKeys,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            persist: true,
            version: None,
            replacer: identity(),
            reviver: identity(),
            throttle: Duration::from_secs(1),
            keys: StorageKeys::default(),
        }
    }
}

impl fmt::Debug for PersistConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistConfig")
            .field("persist", &self.persist)
            .field("version", &self.version)
            .field("throttle", &self.throttle)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
