use crate::error::StoreResult;

/// Key-value capability that ledger logic runs against.
///
/// Implementations must satisfy these invariants:
/// - `range_scan` yields keys in lexicographic order, start inclusive and end
///   exclusive; an empty bound is unbounded on that side.
/// - `put_state` replaces any previous value for the key in full.
/// - Readers may observe a view that excludes the caller's own pending writes
///   (endorsement simulators behave this way); logic must not rely on
///   reading back what it just wrote.
pub trait WorldState {
    /// Read a key. Returns `Ok(None)` if the key is absent.
    fn get_state(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write a key.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete_state(&mut self, key: &str) -> StoreResult<()>;

    /// All entries with `start <= key < end`, in key order.
    fn range_scan(&mut self, start: &str, end: &str) -> StoreResult<Vec<(String, Vec<u8>)>>;
}

/// Validate a key before it reaches a backend.
pub(crate) fn check_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(crate::error::StoreError::EmptyKey);
    }
    Ok(())
}

/// Validate range bounds; an empty `end` is unbounded.
pub(crate) fn check_range(start: &str, end: &str) -> StoreResult<()> {
    if !end.is_empty() && start > end {
        return Err(crate::error::StoreError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

/// `true` if `key` falls in `[start, end)` with empty bounds open.
pub(crate) fn in_range(key: &str, start: &str, end: &str) -> bool {
    key >= start && (end.is_empty() || key < end)
}
