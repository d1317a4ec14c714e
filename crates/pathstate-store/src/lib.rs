//! Session-scoped key-value storage for pathstate.
//!
//! Persisted snapshots live in a [`SessionStore`]: a flat string-to-string
//! map whose lifetime is one session. The persistence layer keeps exactly two
//! entries per namespace in it, the JSON text of the redacted tree and the
//! schema version tag.
//!
//! # Backends
//!
//! - [`InMemorySessionStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileSessionStore`] -- one file per key inside a session directory
//!
//! # Design Rules
//!
//! 1. The store never interprets values; it is a pure key-value store.
//! 2. Writes replace the whole entry; readers never see a partial value.
//! 3. Keys are validated before they reach the backend.
//! 4. Ending the session (`clear`) removes every entry.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileSessionStore;
pub use memory::InMemorySessionStore;
pub use traits::{validate_key, SessionStore};
