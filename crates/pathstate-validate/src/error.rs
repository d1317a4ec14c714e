use std::fmt;

use pathstate_types::OperationKind;

/// What an operation needed from its argument or target value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    WellFormedPath,
    Number,
    Array,
    Function,
    Predicate,
    BooleanOrUndefined,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::WellFormedPath => "a well-formed path",
            Self::Number => "a number",
            Self::Array => "an array",
            Self::Function => "a function",
            Self::Predicate => "a predicate function",
            Self::BooleanOrUndefined => "a boolean or undefined",
        };
        f.write_str(text)
    }
}

/// A caller passed an argument, or targeted a value, of the wrong shape.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{operation} requires {expectation}, but {subject} value is {actual}")]
pub struct ValidationError {
    /// The operation that was rejected.
    pub operation: OperationKind,
    /// What the operation required.
    pub expectation: Expectation,
    /// What was inspected: a path, `"path"`, `"delta"`, or `"payload"`.
    pub subject: String,
    /// Rendering of the value that was found.
    pub actual: String,
}

/// Result alias for validation checks.
pub type ValidationResult<T> = Result<T, ValidationError>;
