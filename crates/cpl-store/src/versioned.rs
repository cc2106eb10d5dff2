use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreResult;
use crate::rwset::{KvRead, KvWrite};
use crate::traits::{check_key, check_range, in_range};

/// Position of the transaction that last wrote a key: block number and
/// index of the transaction within that block.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub block: u64,
    pub tx: u32,
}

impl Version {
    pub fn new(block: u64, tx: u32) -> Self {
        Self { block, tx }
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.block, self.tx)
    }
}

/// A committed value together with its version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: Version,
}

/// Committed world state of a peer.
///
/// Readers take a shared lock and see only committed data. Writes go through
/// [`VersionedStore::apply`], which the committer calls once per valid
/// transaction in block order.
pub struct VersionedStore {
    entries: RwLock<BTreeMap<String, VersionedValue>>,
}

impl VersionedStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> StoreResult<Option<VersionedValue>> {
        check_key(key)?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    pub fn version_of(&self, key: &str) -> Option<Version> {
        let map = self.entries.read().expect("lock poisoned");
        map.get(key).map(|v| v.version)
    }

    /// Committed entries with `start <= key < end`, in key order.
    pub fn range(&self, start: &str, end: &str) -> StoreResult<Vec<(String, VersionedValue)>> {
        check_range(start, end)?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map
            .range(start.to_string()..)
            .take_while(|(k, _)| in_range(k, start, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Returns the first read whose observed version no longer matches the
    /// committed one, or `None` if every read is still current.
    pub fn first_stale_read<'a>(&self, reads: &'a [KvRead]) -> Option<&'a KvRead> {
        let map = self.entries.read().expect("lock poisoned");
        reads
            .iter()
            .find(|read| map.get(&read.key).map(|v| v.version) != read.version)
    }

    /// Apply a transaction's write set, stamping every written key with
    /// `version`.
    pub fn apply(&self, writes: &[KvWrite], version: Version) {
        let mut map = self.entries.write().expect("lock poisoned");
        for write in writes {
            match &write.value {
                Some(value) => {
                    map.insert(
                        write.key.clone(),
                        VersionedValue {
                            value: value.clone(),
                            version,
                        },
                    );
                }
                None => {
                    map.remove(&write.key);
                }
            }
        }
        debug!(?version, writes = writes.len(), "write set applied");
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VersionedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedStore")
            .field("key_count", &self.len())
            .finish()
    }
}
