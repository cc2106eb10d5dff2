use serde::{Deserialize, Serialize};

use crate::versioned::Version;

/// A key read during simulation and the committed version it observed.
///
/// `version` is `None` when the key was absent at simulation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvRead {
    pub key: String,
    pub version: Option<Version>,
}

/// A buffered write. `value: None` deletes the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvWrite {
    pub key: String,
    pub value: Option<Vec<u8>>,
}

impl KvWrite {
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

/// Everything a simulated transaction read and intends to write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWriteSet {
    pub reads: Vec<KvRead>,
    pub writes: Vec<KvWrite>,
}

impl ReadWriteSet {
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}
