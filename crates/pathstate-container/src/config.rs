use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pathstate_path::{DottedPathResolver, PathResolver};
use pathstate_persist::{identity, PersistConfig, Redactor, StorageKeys, DEFAULT_NAMESPACE};
use pathstate_store::{InMemorySessionStore, SessionStore};
use pathstate_types::Tree;

use crate::error::{ContainerError, ContainerResult};

/// Plain, serializable container options.
///
/// Every field has a default, so a TOML document only needs the keys it
/// changes:
///
/// ```
/// use pathstate_container::ContainerOptions;
///
/// let options = ContainerOptions::from_toml_str("version = \"v2\"\nvalidate = true").unwrap();
/// assert_eq!(options.version.as_deref(), Some("v2"));
/// assert!(options.validate);
/// assert!(options.persist);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Persist committed trees to the session store.
    pub persist: bool,
    /// Schema tag for persisted snapshots.
    pub version: Option<String>,
    /// Emit an `info` event for every committed operation.
    pub log: bool,
    /// Check operation arguments before enqueueing.
    pub validate: bool,
    /// Minimum milliseconds between physical snapshot writes.
    pub throttle_ms: u64,
    /// Prefix of the two store keys.
    pub namespace: String,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            persist: true,
            version: None,
            log: false,
            validate: false,
            throttle_ms: 1000,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl ContainerOptions {
    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> ContainerResult<Self> {
        toml::from_str(text).map_err(|e| ContainerError::Config(e.to_string()))
    }

    /// The throttle interval as a `Duration`.
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Everything a [`StateContainer`](crate::StateContainer) needs at
/// construction.
///
/// Configuration is held per container; nothing here is shared between
/// instances unless the caller shares the store or resolver on purpose.
#[derive(Clone)]
pub struct ContainerConfig {
    /// The declared initial state.
    pub initial_state: Tree,
    /// Serializable options.
    pub options: ContainerOptions,
    /// Applied to the tree before it is persisted.
    pub replacer: Redactor,
    /// Applied to a persisted tree after it is loaded.
    pub reviver: Redactor,
    /// Backing session store.
    pub store: Arc<dyn SessionStore>,
    /// Path resolution strategy.
    pub resolver: Arc<dyn PathResolver>,
}

impl ContainerConfig {
    /// Configuration with default options around `initial_state`.
    pub fn new(initial_state: Tree) -> Self {
        Self {
            initial_state,
            options: ContainerOptions::default(),
            replacer: identity(),
            reviver: identity(),
            store: Arc::new(InMemorySessionStore::new()),
            resolver: Arc::new(DottedPathResolver::new()),
        }
    }

    pub fn with_initial_state(mut self, initial_state: Tree) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.options.persist = persist;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.options.version = Some(version.into());
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.options.log = log;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.options.validate = validate;
        self
    }

    /// Intervals beyond `u64::MAX` milliseconds saturate.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.options.throttle_ms = u64::try_from(throttle.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.options.namespace = namespace.into();
        self
    }

    pub fn with_replacer<F>(mut self, replacer: F) -> Self
    where
        F: Fn(Tree) -> Tree + Send + Sync + 'static,
    {
        self.replacer = Arc::new(replacer);
        self
    }

    pub fn with_reviver<F>(mut self, reviver: F) -> Self
    where
        F: Fn(Tree) -> Tree + Send + Sync + 'static,
    {
        self.reviver = Arc::new(reviver);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// The persistence adapter's view of this configuration.
    pub fn persist_config(&self) -> PersistConfig {
        PersistConfig {
            persist: self.options.persist,
            version: self.options.version.clone(),
            replacer: Arc::clone(&self.replacer),
            reviver: Arc::clone(&self.reviver),
            throttle: self.options.throttle(),
            keys: StorageKeys::for_namespace(&self.options.namespace),
        }
    }
}

impl fmt::Debug for ContainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerConfig")
            .field("initial_state", &self.initial_state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_options() {
        let o = ContainerOptions::default();
        assert!(o.persist);
        assert!(!o.log);
        assert!(!o.validate);
        assert!(o.version.is_none());
        assert_eq!(o.throttle(), Duration::from_secs(1));
        assert_eq!(o.namespace, "pathstate");
    }

    #[test]
    fn options_from_partial_toml() {
        let o = ContainerOptions::from_toml_str(
            "persist = false\nlog = true\nthrottle_ms = 250\nnamespace = \"todo\"",
        )
        .unwrap();
        assert!(!o.persist);
        assert!(o.log);
        assert_eq!(o.throttle(), Duration::from_millis(250));
        assert_eq!(o.namespace, "todo");
        assert!(o.version.is_none());
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = ContainerOptions::from_toml_str("persist = \"maybe\"").unwrap_err();
        assert!(matches!(err, ContainerError::Config(_)));
    }

    #[test]
    fn builder_feeds_persist_config() {
        let config = ContainerConfig::new(json!({}))
            .with_version("v3")
            .with_namespace("app")
            .with_throttle(Duration::from_millis(40))
            .with_persist(false);
        let p = config.persist_config();
        assert!(!p.persist);
        assert_eq!(p.version.as_deref(), Some("v3"));
        assert_eq!(p.throttle, Duration::from_millis(40));
        assert_eq!(p.keys.state, "app-state");
    }

    #[test]
    fn oversized_throttle_saturates() {
        let config = ContainerConfig::new(json!({})).with_throttle(Duration::MAX);
        assert_eq!(config.options.throttle_ms, u64::MAX);

        let config = ContainerConfig::new(json!({})).with_throttle(Duration::from_millis(u64::MAX));
        assert_eq!(config.options.throttle_ms, u64::MAX);
    }
}
