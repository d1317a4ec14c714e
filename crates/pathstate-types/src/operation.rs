use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The operations a state container understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Pure read. Never enters the serializer.
    Get,
    /// Replace the value at a path.
    Set,
    /// Remove the key at a path.
    Delete,
    /// Add a delta to a number.
    Increment,
    /// Subtract a delta from a number.
    Decrement,
    /// Negate a boolean; an absent value counts as `false`.
    Toggle,
    /// Append values to a sequence.
    Push,
    /// Replace a sequence with its element-wise image.
    Map,
    /// Keep the elements of a sequence that match a predicate.
    Filter,
    /// Replace a value with the result of a function.
    Transform,
}

impl OperationKind {
    /// Every kind, in declaration order.
    pub const ALL: [OperationKind; 10] = [
        Self::Get,
        Self::Set,
        Self::Delete,
        Self::Increment,
        Self::Decrement,
        Self::Toggle,
        Self::Push,
        Self::Map,
        Self::Filter,
        Self::Transform,
    ];

    /// The lower-case operation name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Delete => "delete",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Toggle => "toggle",
            Self::Push => "push",
            Self::Map => "map",
            Self::Filter => "filter",
            Self::Transform => "transform",
        }
    }

    /// Returns `true` for kinds that do not change the tree.
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TypeError::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.name().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "pop".parse::<OperationKind>().unwrap_err();
        assert_eq!(err, TypeError::UnknownOperation("pop".into()));
        assert_eq!(err.to_string(), "unknown operation kind: pop");
    }

    #[test]
    fn only_get_is_read_only() {
        let read_only: Vec<_> = OperationKind::ALL
            .into_iter()
            .filter(|k| k.is_read_only())
            .collect();
        assert_eq!(read_only, vec![OperationKind::Get]);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&OperationKind::Increment).unwrap();
        assert_eq!(json, "\"increment\"");
    }
}
