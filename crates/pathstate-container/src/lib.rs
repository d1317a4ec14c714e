//! Path-addressed state container.
//!
//! A [`StateContainer`] owns one state tree. Callers change it through the
//! [`MethodTable`] (`set`, `delete`, `increment`, `toggle`, `push`, `map`,
//! `filter`, `transform`, ...), addressing values with dotted paths such as
//! `"user.address.city"`. Every mutation is validated (optionally), queued on
//! a single serializer task, and applied in submission order to the tree
//! committed by its predecessor. Committed trees are persisted through a
//! throttled writer and restored on the next construction.
//!
//! # Example
//!
//! ```no_run
//! use pathstate_container::{ContainerConfig, StateContainer};
//! use serde_json::json;
//!
//! # async fn demo() -> pathstate_container::ContainerResult<()> {
//! let container = StateContainer::new(
//!     ContainerConfig::new(json!({"count": 0, "todos": []})).with_version("v1"),
//! );
//! container.increment("count")?.await?;
//! container.push("todos", ["write docs"])?.await?;
//! assert_eq!(container.get("count"), Some(json!(1)));
//! container.close().await;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod container;
pub mod error;
pub mod operation;
pub mod provider;
pub mod serializer;

pub use binding::{
    ChangeResult, CheckboxItem, Checkbox, Checkboxes, InputKind, RadioGroup, RadioOption, Select,
    TextArea, TextInput,
};
pub use config::{ContainerConfig, ContainerOptions};
pub use container::{MethodTable, StateContainer};
pub use error::{ApplyError, ContainerError, ContainerResult};
pub use operation::{ElementFn, Operation, Payload, PredicateFn, TransformFn};
pub use provider::{Consumer, Provider};
pub use serializer::{Completion, OperationSerializer};

pub use pathstate_types::{StatePath, Tree};
