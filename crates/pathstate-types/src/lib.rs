//! Foundation types for pathstate.
//!
//! This crate provides the data model shared by every other pathstate crate.
//!
//! # Key Types
//!
//! - [`Tree`]: the state document (nested mappings, sequences, scalars)
//! - [`StatePath`]: a parsed dot-delimited location inside a [`Tree`]
//! - [`Segment`]: one component of a [`StatePath`]
//! - [`OperationKind`]: the names of the ten state operations
//! - [`number`]: integer-preserving arithmetic for increment/decrement

pub mod error;
pub mod number;
pub mod operation;
pub mod path;

pub use error::TypeError;
pub use operation::OperationKind;
pub use path::{Segment, StatePath};

/// The state document: the single source of truth held by a container.
///
/// Mappings are JSON objects, sequences are JSON arrays. An absent location is
/// represented by `None` wherever a lookup can miss.
pub type Tree = serde_json::Value;

/// Describe the shape of a possibly-absent value for diagnostics.
///
/// Absent values render as `undefined`; everything else renders as compact
/// JSON so messages show the offending value itself.
pub fn describe(value: Option<&Tree>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describe_absent_and_present() {
        assert_eq!(describe(None), "undefined");
        assert_eq!(describe(Some(&json!("x"))), "\"x\"");
        assert_eq!(describe(Some(&json!([1, 2]))), "[1,2]");
    }
}
