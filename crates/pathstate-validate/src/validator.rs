use tracing::debug;

use pathstate_types::{describe, OperationKind, StatePath, Tree};

use crate::error::{Expectation, ValidationError, ValidationResult};

/// Shape of an operation payload, as far as validation is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
    /// No payload.
    Absent,
    /// A single value.
    Value,
    /// A list of values.
    Values,
    /// A value-to-value function.
    Function,
    /// A value-to-bool function.
    Predicate,
}

impl PayloadShape {
    fn describe(self) -> &'static str {
        match self {
            Self::Absent => "undefined",
            Self::Value => "a value",
            Self::Values => "a list of values",
            Self::Function => "a function",
            Self::Predicate => "a predicate function",
        }
    }
}

/// Runs precondition checks for state operations.
///
/// Every check returns `Ok(())` immediately when the validator is disabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Validator {
    enabled: bool,
}

impl Validator {
    /// Create a validator, enabled or not.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A validator that checks everything.
    pub fn enabled() -> Self {
        Self::new(true)
    }

    /// A validator whose checks are all no-ops.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Whether checks run.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The path must be non-empty with no empty segments.
    pub fn path(&self, operation: OperationKind, path: &StatePath) -> ValidationResult<()> {
        if !self.enabled || path.is_well_formed() {
            return Ok(());
        }
        Err(reject(
            operation,
            Expectation::WellFormedPath,
            "path",
            format!("{:?}", path.as_str()),
        ))
    }

    /// `value` (found at `subject`) must be a number.
    pub fn number(
        &self,
        operation: OperationKind,
        subject: &str,
        value: Option<&Tree>,
    ) -> ValidationResult<()> {
        if !self.enabled || value.is_some_and(Tree::is_number) {
            return Ok(());
        }
        Err(reject(operation, Expectation::Number, subject, describe(value)))
    }

    /// The value at `path` must be an array.
    pub fn array(
        &self,
        operation: OperationKind,
        path: &StatePath,
        value: Option<&Tree>,
    ) -> ValidationResult<()> {
        if !self.enabled || value.is_some_and(Tree::is_array) {
            return Ok(());
        }
        Err(reject(
            operation,
            Expectation::Array,
            path.as_str(),
            describe(value),
        ))
    }

    /// The value at `path` must be a boolean or absent.
    pub fn boolean_or_undefined(
        &self,
        operation: OperationKind,
        path: &StatePath,
        value: Option<&Tree>,
    ) -> ValidationResult<()> {
        if !self.enabled || value.map_or(true, Tree::is_boolean) {
            return Ok(());
        }
        Err(reject(
            operation,
            Expectation::BooleanOrUndefined,
            path.as_str(),
            describe(value),
        ))
    }

    /// The payload must be a value-to-value function.
    pub fn function(&self, operation: OperationKind, payload: PayloadShape) -> ValidationResult<()> {
        self.callable(operation, payload, PayloadShape::Function, Expectation::Function)
    }

    /// The payload must be a value-to-bool function.
    pub fn predicate(&self, operation: OperationKind, payload: PayloadShape) -> ValidationResult<()> {
        self.callable(operation, payload, PayloadShape::Predicate, Expectation::Predicate)
    }

    fn callable(
        &self,
        operation: OperationKind,
        payload: PayloadShape,
        wanted: PayloadShape,
        expectation: Expectation,
    ) -> ValidationResult<()> {
        if !self.enabled || payload == wanted {
            return Ok(());
        }
        Err(reject(operation, expectation, "payload", payload.describe().to_string()))
    }
}

fn reject(
    operation: OperationKind,
    expectation: Expectation,
    subject: &str,
    actual: String,
) -> ValidationError {
    debug!(%operation, %expectation, subject, actual = %actual, "validation failed");
    ValidationError {
        operation,
        expectation,
        subject: subject.to_string(),
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> StatePath {
        StatePath::parse(s)
    }

    #[test]
    fn number_check_message() {
        let v = Validator::enabled();
        let err = v
            .number(OperationKind::Decrement, "foo.bar", Some(&json!("x")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "decrement requires a number, but foo.bar value is \"x\""
        );
        assert_eq!(err.expectation, Expectation::Number);
    }

    #[test]
    fn number_check_rejects_absent() {
        let v = Validator::enabled();
        let err = v.number(OperationKind::Increment, "a.b", None).unwrap_err();
        assert_eq!(err.actual, "undefined");
        assert!(v.number(OperationKind::Increment, "a.b", Some(&json!(1.5))).is_ok());
    }

    #[test]
    fn array_check() {
        let v = Validator::enabled();
        assert!(v.array(OperationKind::Push, &p("a"), Some(&json!([]))).is_ok());
        let err = v
            .array(OperationKind::Filter, &p("a"), Some(&json!({"k": 1})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "filter requires an array, but a value is {\"k\":1}"
        );
    }

    #[test]
    fn path_check() {
        let v = Validator::enabled();
        assert!(v.path(OperationKind::Set, &p("a.b")).is_ok());
        let err = v.path(OperationKind::Set, &p("a..b")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "set requires a well-formed path, but path value is \"a..b\""
        );
        assert!(v.path(OperationKind::Delete, &p("")).is_err());
    }

    #[test]
    fn toggle_accepts_boolean_or_absent() {
        let v = Validator::enabled();
        assert!(v.boolean_or_undefined(OperationKind::Toggle, &p("a"), None).is_ok());
        assert!(v
            .boolean_or_undefined(OperationKind::Toggle, &p("a"), Some(&json!(true)))
            .is_ok());
        let err = v
            .boolean_or_undefined(OperationKind::Toggle, &p("a"), Some(&json!(0)))
            .unwrap_err();
        assert_eq!(err.expectation, Expectation::BooleanOrUndefined);
    }

    #[test]
    fn callable_checks() {
        let v = Validator::enabled();
        assert!(v.function(OperationKind::Map, PayloadShape::Function).is_ok());
        assert!(v.predicate(OperationKind::Filter, PayloadShape::Predicate).is_ok());
        let err = v
            .function(OperationKind::Transform, PayloadShape::Value)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "transform requires a function, but payload value is a value"
        );
        assert!(v.predicate(OperationKind::Filter, PayloadShape::Function).is_err());
    }

    #[test]
    fn disabled_validator_accepts_everything() {
        let v = Validator::disabled();
        assert!(!v.is_enabled());
        assert!(v.path(OperationKind::Set, &p("")).is_ok());
        assert!(v.number(OperationKind::Increment, "x", Some(&json!("x"))).is_ok());
        assert!(v.array(OperationKind::Map, &p("x"), None).is_ok());
        assert!(v.boolean_or_undefined(OperationKind::Toggle, &p("x"), Some(&json!(1))).is_ok());
        assert!(v.function(OperationKind::Map, PayloadShape::Absent).is_ok());
    }

    #[test]
    fn default_is_disabled() {
        assert_eq!(Validator::default(), Validator::disabled());
    }
}
