//! Operations: an immutable request to change the tree at one path.
//!
//! An [`Operation`] pairs an [`OperationKind`] with a [`StatePath`] and a
//! [`Payload`]. Applying it to a tree through a [`PathResolver`] yields the
//! next tree; the input tree is never modified.

use std::fmt;
use std::sync::Arc;

use pathstate_path::PathResolver;
use pathstate_types::{describe, number, OperationKind, StatePath, Tree};
use pathstate_validate::PayloadShape;

use crate::error::ApplyError;

/// Element-wise function used by `map`.
pub type ElementFn = Arc<dyn Fn(&Tree) -> Tree + Send + Sync>;

/// Element predicate used by `filter`.
pub type PredicateFn = Arc<dyn Fn(&Tree) -> bool + Send + Sync>;

/// Whole-value function used by `transform`; receives `None` when the path
/// is absent.
pub type TransformFn = Arc<dyn Fn(Option<&Tree>) -> Tree + Send + Sync>;

/// The argument carried by an operation.
#[derive(Clone)]
pub enum Payload {
    None,
    Value(Tree),
    Values(Vec<Tree>),
    Map(ElementFn),
    Filter(PredicateFn),
    Transform(TransformFn),
}

impl Payload {
    /// The payload's shape as seen by the validator.
    pub fn shape(&self) -> PayloadShape {
        match self {
            Self::None => PayloadShape::Absent,
            Self::Value(_) => PayloadShape::Value,
            Self::Values(_) => PayloadShape::Values,
            Self::Map(_) | Self::Transform(_) => PayloadShape::Function,
            Self::Filter(_) => PayloadShape::Predicate,
        }
    }

    /// The single value, if this payload is one.
    pub fn as_value(&self) -> Option<&Tree> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::None => "no payload",
            Self::Value(_) => "a value",
            Self::Values(_) => "a list of values",
            Self::Map(_) => "an element function",
            Self::Filter(_) => "a predicate",
            Self::Transform(_) => "a transform function",
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Values(vs) => f.debug_tuple("Values").field(vs).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// A pending mutation request.
#[derive(Clone, Debug)]
pub struct Operation {
    kind: OperationKind,
    path: StatePath,
    payload: Payload,
}

impl Operation {
    /// Build an operation from its parts.
    ///
    /// No check is made that the payload fits the kind; a mismatch is reported
    /// as a programming error when the operation is applied.
    pub fn new(kind: OperationKind, path: impl Into<StatePath>, payload: Payload) -> Self {
        Self {
            kind,
            path: path.into(),
            payload,
        }
    }

    pub fn set(path: impl Into<StatePath>, value: impl Into<Tree>) -> Self {
        Self::new(OperationKind::Set, path, Payload::Value(value.into()))
    }

    pub fn delete(path: impl Into<StatePath>) -> Self {
        Self::new(OperationKind::Delete, path, Payload::None)
    }

    pub fn increment(path: impl Into<StatePath>, delta: impl Into<Tree>) -> Self {
        Self::new(OperationKind::Increment, path, Payload::Value(delta.into()))
    }

    pub fn decrement(path: impl Into<StatePath>, delta: impl Into<Tree>) -> Self {
        Self::new(OperationKind::Decrement, path, Payload::Value(delta.into()))
    }

    pub fn toggle(path: impl Into<StatePath>) -> Self {
        Self::new(OperationKind::Toggle, path, Payload::None)
    }

    pub fn push(path: impl Into<StatePath>, values: Vec<Tree>) -> Self {
        Self::new(OperationKind::Push, path, Payload::Values(values))
    }

    pub fn map<F>(path: impl Into<StatePath>, f: F) -> Self
    where
        F: Fn(&Tree) -> Tree + Send + Sync + 'static,
    {
        Self::new(OperationKind::Map, path, Payload::Map(Arc::new(f)))
    }

    pub fn filter<F>(path: impl Into<StatePath>, predicate: F) -> Self
    where
        F: Fn(&Tree) -> bool + Send + Sync + 'static,
    {
        Self::new(OperationKind::Filter, path, Payload::Filter(Arc::new(predicate)))
    }

    pub fn transform<F>(path: impl Into<StatePath>, f: F) -> Self
    where
        F: Fn(Option<&Tree>) -> Tree + Send + Sync + 'static,
    {
        Self::new(OperationKind::Transform, path, Payload::Transform(Arc::new(f)))
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn path(&self) -> &StatePath {
        &self.path
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Short human-readable description of the payload for logs.
    pub fn detail(&self) -> String {
        match &self.payload {
            Payload::None => String::new(),
            Payload::Value(v) => match self.kind {
                OperationKind::Increment | OperationKind::Decrement => format!("by {v}"),
                _ => format!("to {v}"),
            },
            Payload::Values(vs) => format!("with {}", Tree::Array(vs.clone())),
            other => format!("using {}", other.name()),
        }
    }

    /// Compute the tree that results from applying this operation to `tree`.
    pub fn apply(&self, resolver: &dyn PathResolver, tree: &Tree) -> Result<Tree, ApplyError> {
        if self.kind.is_read_only() {
            return Err(ApplyError::ReadOnly(self.kind));
        }
        let path = &self.path;
        let current = resolver.get(tree, path);
        match (self.kind, &self.payload) {
            (OperationKind::Set, Payload::Value(value)) => {
                Ok(resolver.set(tree, path, value.clone()))
            }
            (OperationKind::Delete, Payload::None) => Ok(resolver.omit(tree, path)),
            (OperationKind::Increment, Payload::Value(delta)) => {
                let next = self.arithmetic(current, delta, number::add)?;
                Ok(resolver.set(tree, path, next))
            }
            (OperationKind::Decrement, Payload::Value(delta)) => {
                let next = self.arithmetic(current, delta, number::sub)?;
                Ok(resolver.set(tree, path, next))
            }
            (OperationKind::Toggle, Payload::None) => match current {
                None => Ok(resolver.set(tree, path, Tree::Bool(true))),
                Some(Tree::Bool(b)) => Ok(resolver.set(tree, path, Tree::Bool(!b))),
                Some(other) => Err(self.shape("a boolean", Some(other))),
            },
            (OperationKind::Push, Payload::Values(values)) => {
                let mut items = self.array(current)?.to_vec();
                items.extend(values.iter().cloned());
                Ok(resolver.set(tree, path, Tree::Array(items)))
            }
            (OperationKind::Map, Payload::Map(f)) => {
                let items = self.array(current)?.iter().map(|v| f(v)).collect();
                Ok(resolver.set(tree, path, Tree::Array(items)))
            }
            (OperationKind::Filter, Payload::Filter(keep)) => {
                let items = self
                    .array(current)?
                    .iter()
                    .filter(|v| keep(*v))
                    .cloned()
                    .collect();
                Ok(resolver.set(tree, path, Tree::Array(items)))
            }
            (OperationKind::Transform, Payload::Transform(f)) => {
                Ok(resolver.update(tree, path, &|v| f(v)))
            }
            (kind, payload) => Err(ApplyError::PayloadMismatch {
                operation: kind,
                payload: payload.name(),
            }),
        }
    }

    fn arithmetic(
        &self,
        current: Option<&Tree>,
        delta: &Tree,
        op: fn(&serde_json::Number, &serde_json::Number) -> Option<serde_json::Number>,
    ) -> Result<Tree, ApplyError> {
        let Tree::Number(delta_n) = delta else {
            return Err(ApplyError::Shape {
                operation: self.kind,
                path: "delta".to_string(),
                expected: "a number",
                actual: delta.to_string(),
            });
        };
        let Some(Tree::Number(base)) = current else {
            return Err(self.shape("a number", current));
        };
        op(base, delta_n)
            .map(Tree::Number)
            .ok_or_else(|| self.shape("a finite result", current))
    }

    fn array<'a>(&self, current: Option<&'a Tree>) -> Result<&'a [Tree], ApplyError> {
        match current {
            Some(Tree::Array(items)) => Ok(items),
            other => Err(self.shape("an array", other)),
        }
    }

    fn shape(&self, expected: &'static str, found: Option<&Tree>) -> ApplyError {
        ApplyError::Shape {
            operation: self.kind,
            path: self.path.to_string(),
            expected,
            actual: describe(found),
        }
    }
}
