use crate::error::{StoreError, StoreResult};

/// Session-scoped string key-value store.
///
/// All implementations must satisfy these invariants:
/// - `set_item` replaces the whole entry atomically.
/// - `get_item` returns `Ok(None)` for a missing key, never an error.
/// - `remove_item` of a missing key is a no-op returning `Ok(false)`.
/// - `clear` ends the session: afterwards every key is missing.
pub trait SessionStore: Send + Sync {
    /// Read the entry stored under `key`.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Create or replace the entry under `key`.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove the entry under `key`. Returns `true` if it existed.
    fn remove_item(&self, key: &str) -> StoreResult<bool>;

    /// List all keys, sorted.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Remove every entry.
    fn clear(&self) -> StoreResult<()>;
}

/// Validate a key, returning `Ok(())` if every backend can store it.
///
/// Keys must be non-empty and made of ASCII letters, digits, `-`, `_`, `.`
/// and `:`; they must not start with `.`.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let reason = if key.is_empty() {
        Some("key must not be empty".to_string())
    } else if key.starts_with('.') {
        Some("key must not start with '.'".to_string())
    } else {
        key.chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
            .map(|c| format!("contains forbidden character: {c:?}"))
    };
    match reason {
        None => Ok(()),
        Some(reason) => Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_namespaced_keys() {
        assert!(validate_key("pathstate-state").is_ok());
        assert!(validate_key("app:v1.version").is_ok());
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("with space").is_err());
        let err = validate_key("a/b").unwrap_err();
        assert!(err.to_string().contains("forbidden character"));
    }
}
