//! Precondition checks for pathstate operations.
//!
//! A [`Validator`] runs one check per precondition (well-formed path, number,
//! array, function, boolean-or-absent) and fails with a [`ValidationError`]
//! describing what the operation required and what it found. Validation is
//! switched per instance: a disabled validator turns every check into a
//! no-op, which is the intended production setting.

pub mod error;
pub mod validator;

pub use error::{Expectation, ValidationError, ValidationResult};
pub use validator::{PayloadShape, Validator};
