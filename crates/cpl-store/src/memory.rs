use std::collections::BTreeMap;

use crate::error::StoreResult;
use crate::traits::{check_key, check_range, in_range, WorldState};

/// Plain in-memory world state.
///
/// Writes are visible to subsequent reads immediately. Intended for unit
/// tests of ledger logic and for embedding where no versioning is needed.
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted list of all keys.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Raw value for a key without going through the capability.
    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }
}

impl WorldState for MemoryState {
    fn get_state(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        check_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        check_key(key)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        self.entries.remove(key);
        Ok(())
    }

    fn range_scan(&mut self, start: &str, end: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        check_range(start, end)?;
        Ok(self
            .entries
            .range(start.to_string()..)
            .take_while(|(k, _)| in_range(k, start, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
