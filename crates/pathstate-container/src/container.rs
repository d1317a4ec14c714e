use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use pathstate_path::PathResolver;
use pathstate_persist::{Persistence, ThrottledWriter};
use pathstate_types::{OperationKind, StatePath, Tree};
use pathstate_validate::Validator;

use crate::config::ContainerConfig;
use crate::error::{ContainerError, ContainerResult};
use crate::operation::{Operation, Payload};
use crate::provider::Consumer;
use crate::serializer::{Committer, Completion, OperationSerializer};

/// The bound operations of one container.
///
/// Every mutating method validates against the committed tree (when
/// validation is on), then enqueues the operation and returns its
/// [`Completion`]. Validation failures are returned immediately and nothing is
/// enqueued. Cloning is cheap; all clones feed the same serializer.
#[derive(Clone)]
pub struct MethodTable {
    tree: watch::Receiver<Arc<Tree>>,
    resolver: Arc<dyn PathResolver>,
    validator: Validator,
    serializer: OperationSerializer,
}

impl MethodTable {
    /// Read the committed value at `path`.
    ///
    /// Reads are not ordered behind pending operations; await a mutation's
    /// completion first to observe its effect.
    pub fn get(&self, path: impl Into<StatePath>) -> Option<Tree> {
        let path = path.into();
        let tree = self.snapshot();
        self.resolver.get(&tree, &path).cloned()
    }

    /// The committed tree.
    pub fn snapshot(&self) -> Arc<Tree> {
        self.tree.borrow().clone()
    }

    /// A receiver notified on every commit.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Tree>> {
        self.tree.clone()
    }

    /// Validate `operation` and enqueue it.
    pub fn submit(&self, operation: Operation) -> ContainerResult<Completion> {
        if self.serializer.is_closed() {
            return Err(ContainerError::Closed);
        }
        self.validate(&operation)?;
        Ok(self.serializer.submit(operation))
    }

    pub fn set(&self, path: impl Into<StatePath>, value: impl Into<Tree>) -> ContainerResult<Completion> {
        self.submit(Operation::set(path, value))
    }

    pub fn delete(&self, path: impl Into<StatePath>) -> ContainerResult<Completion> {
        self.submit(Operation::delete(path))
    }

    /// Add 1 to the number at `path`.
    pub fn increment(&self, path: impl Into<StatePath>) -> ContainerResult<Completion> {
        self.increment_by(path, 1)
    }

    pub fn increment_by(
        &self,
        path: impl Into<StatePath>,
        delta: impl Into<Tree>,
    ) -> ContainerResult<Completion> {
        self.submit(Operation::increment(path, delta))
    }

    /// Subtract 1 from the number at `path`.
    pub fn decrement(&self, path: impl Into<StatePath>) -> ContainerResult<Completion> {
        self.decrement_by(path, 1)
    }

    pub fn decrement_by(
        &self,
        path: impl Into<StatePath>,
        delta: impl Into<Tree>,
    ) -> ContainerResult<Completion> {
        self.submit(Operation::decrement(path, delta))
    }

    /// Negate the boolean at `path`; an absent value counts as `false`.
    pub fn toggle(&self, path: impl Into<StatePath>) -> ContainerResult<Completion> {
        self.submit(Operation::toggle(path))
    }

    /// Append `values` to the array at `path`.
    pub fn push<I, V>(&self, path: impl Into<StatePath>, values: I) -> ContainerResult<Completion>
    where
        I: IntoIterator<Item = V>,
        V: Into<Tree>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.submit(Operation::push(path, values))
    }

    pub fn map<F>(&self, path: impl Into<StatePath>, f: F) -> ContainerResult<Completion>
    where
        F: Fn(&Tree) -> Tree + Send + Sync + 'static,
    {
        self.submit(Operation::map(path, f))
    }

    pub fn filter<F>(&self, path: impl Into<StatePath>, predicate: F) -> ContainerResult<Completion>
    where
        F: Fn(&Tree) -> bool + Send + Sync + 'static,
    {
        self.submit(Operation::filter(path, predicate))
    }

    pub fn transform<F>(&self, path: impl Into<StatePath>, f: F) -> ContainerResult<Completion>
    where
        F: Fn(Option<&Tree>) -> Tree + Send + Sync + 'static,
    {
        self.submit(Operation::transform(path, f))
    }

    /// Dump the committed tree at `info` level.
    pub fn log(&self, label: &str) {
        let tree = self.snapshot();
        info!(label, state = %tree, "state dump");
    }

    fn validate(&self, operation: &Operation) -> ContainerResult<()> {
        let v = &self.validator;
        if !v.is_enabled() {
            return Ok(());
        }
        let kind = operation.kind();
        let path = operation.path();
        v.path(kind, path)?;

        let tree = self.snapshot();
        let current = self.resolver.get(&tree, path);
        match kind {
            OperationKind::Increment | OperationKind::Decrement => {
                if let Payload::Value(delta) = operation.payload() {
                    v.number(kind, "delta", Some(delta))?;
                }
                v.number(kind, path.as_str(), current)?;
            }
            OperationKind::Push => v.array(kind, path, current)?,
            OperationKind::Map => {
                v.function(kind, operation.payload().shape())?;
                v.array(kind, path, current)?;
            }
            OperationKind::Filter => {
                v.predicate(kind, operation.payload().shape())?;
                v.array(kind, path, current)?;
            }
            OperationKind::Transform => v.function(kind, operation.payload().shape())?,
            OperationKind::Toggle => v.boolean_or_undefined(kind, path, current)?,
            OperationKind::Get | OperationKind::Set | OperationKind::Delete => {}
        }
        Ok(())
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("validator", &self.validator)
            .field("closed", &self.serializer.is_closed())
            .finish_non_exhaustive()
    }
}

/// Owns one state tree and the machinery that orders and persists changes.
///
/// Dereferences to its [`MethodTable`], so `snapshot`, `subscribe`, `get` and
/// every operation are available on the container itself.
///
/// Must be created inside a tokio runtime: construction spawns the serializer
/// task and, when persistence is on, the snapshot writer.
#[derive(Debug)]
pub struct StateContainer {
    methods: MethodTable,
}

impl StateContainer {
    /// Load any persisted snapshot and start accepting operations.
    pub fn new(config: ContainerConfig) -> Self {
        let persistence = Arc::new(Persistence::new(
            config.persist_config(),
            Arc::clone(&config.store),
        ));
        let loaded = persistence.load(&config.initial_state);
        let tree = merge_top_level(&config.initial_state, loaded);
        let (sender, receiver) = watch::channel(Arc::new(tree));

        let writer = persistence
            .is_enabled()
            .then(|| ThrottledWriter::spawn(Arc::clone(&persistence)));
        let serializer = OperationSerializer::spawn(Committer {
            tree: sender,
            resolver: Arc::clone(&config.resolver),
            writer,
            log: config.options.log,
        });
        debug!(
            persist = config.options.persist,
            validate = config.options.validate,
            namespace = %config.options.namespace,
            "state container started"
        );

        Self {
            methods: MethodTable {
                tree: receiver,
                resolver: config.resolver,
                validator: Validator::new(config.options.validate),
                serializer,
            },
        }
    }

    /// The bound operations.
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// A cloneable read-and-write handle for descendants.
    pub fn consumer(&self) -> Consumer {
        Consumer::new(self.methods.clone())
    }

    /// Apply every queued operation, flush the pending snapshot, and stop.
    pub async fn close(&self) {
        self.methods.serializer.close().await;
    }
}

impl std::ops::Deref for StateContainer {
    type Target = MethodTable;

    fn deref(&self) -> &MethodTable {
        &self.methods
    }
}

/// Overlay the loaded snapshot's top-level keys on the initial state.
fn merge_top_level(initial: &Tree, loaded: Tree) -> Tree {
    match (initial, loaded) {
        (Tree::Object(base), Tree::Object(overlay)) => {
            let mut merged = base.clone();
            merged.extend(overlay);
            Tree::Object(merged)
        }
        (_, loaded) => loaded,
    }
}
