//! Snapshot persistence for pathstate containers.
//!
//! The [`Persistence`] adapter reads and writes the redacted state tree to a
//! [`SessionStore`](pathstate_store::SessionStore), tagged with a schema
//! version. A snapshot is only trusted when its stored version equals the
//! running version; anything else is discarded in favour of the declared
//! initial state.
//!
//! Writes are rate-limited by a [`ThrottledWriter`]: the first save after a
//! quiet period is written immediately, later saves inside the interval are
//! coalesced into one trailing write of the newest tree. Persistence therefore
//! lags the in-memory tree by at most one interval.

pub mod adapter;
pub mod config;
pub mod error;
pub mod throttle;

pub use adapter::Persistence;
pub use config::{identity, PersistConfig, Redactor, StorageKeys, DEFAULT_NAMESPACE};
pub use error::{PersistError, PersistResult};
pub use throttle::ThrottledWriter;
