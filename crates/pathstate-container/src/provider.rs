use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use pathstate_types::Tree;

use crate::config::ContainerConfig;
use crate::container::{MethodTable, StateContainer};

/// Mount point that creates its container exactly once.
///
/// The first [`render`](Provider::render) adopts the initial state it is
/// given; later renders return consumers of the same container and ignore
/// their argument, so re-rendering a host never resets state.
#[derive(Debug)]
pub struct Provider {
    config: ContainerConfig,
    container: OnceLock<StateContainer>,
}

impl Provider {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            container: OnceLock::new(),
        }
    }

    /// Return a consumer, creating the container on first use.
    pub fn render(&self, initial_state: &Tree) -> Consumer {
        self.container
            .get_or_init(|| {
                StateContainer::new(self.config.clone().with_initial_state(initial_state.clone()))
            })
            .consumer()
    }

    /// Whether a container exists for the current mount.
    pub fn is_mounted(&self) -> bool {
        self.container.get().is_some()
    }

    /// Close and drop the container; the next render starts over.
    pub async fn unmount(&mut self) {
        if let Some(container) = self.container.take() {
            container.close().await;
        }
    }
}

/// Handle handed to descendants of a [`Provider`].
///
/// Dereferences to the container's [`MethodTable`].
#[derive(Clone, Debug)]
pub struct Consumer {
    methods: MethodTable,
}

impl Consumer {
    pub(crate) fn new(methods: MethodTable) -> Self {
        Self { methods }
    }

    pub fn snapshot(&self) -> Arc<Tree> {
        self.methods.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Tree>> {
        self.methods.subscribe()
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }
}

impl Deref for Consumer {
    type Target = MethodTable;

    fn deref(&self) -> &MethodTable {
        &self.methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> Provider {
        Provider::new(ContainerConfig::new(json!({})).with_persist(false))
    }

    #[tokio::test]
    async fn initial_state_is_adopted_once() {
        let p = provider();
        assert!(!p.is_mounted());
        let first = p.render(&json!({"count": 1}));
        first.increment("count").unwrap().await.unwrap();

        let second = p.render(&json!({"count": 100}));
        assert_eq!(second.get("count"), Some(json!(2)));
        assert!(p.is_mounted());
    }

    #[tokio::test]
    async fn consumers_share_one_tree() {
        let p = provider();
        let a = p.render(&json!({"items": []}));
        let b = a.clone();
        a.push("items", ["x"]).unwrap().await.unwrap();
        assert_eq!(b.snapshot()["items"], json!(["x"]));
        assert_eq!(b.methods().get("items.0"), Some(json!("x")));
    }

    #[tokio::test]
    async fn unmount_starts_fresh() {
        let mut p = provider();
        let old = p.render(&json!({"n": 1}));
        old.set("n", 5).unwrap().await.unwrap();
        p.unmount().await;
        assert!(!p.is_mounted());
        assert!(old.set("n", 6).is_err());

        let fresh = p.render(&json!({"n": 1}));
        assert_eq!(fresh.get("n"), Some(json!(1)));
    }
}
