use std::collections::BTreeMap;

use cpl_store::{
    KvRead, KvWrite, ReadWriteSet, StoreError, StoreResult, Version, VersionedStore, WorldState,
};

/// World state seen by a transaction while it is being endorsed.
///
/// Reads come from committed state only (a transaction does not observe its
/// own pending writes) and record the version they saw. Writes and deletes
/// are buffered; nothing touches committed state until the transaction is
/// ordered and validated.
pub struct TxSimulator<'a> {
    committed: &'a VersionedStore,
    reads: BTreeMap<String, Option<Version>>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'a> TxSimulator<'a> {
    pub fn new(committed: &'a VersionedStore) -> Self {
        Self {
            committed,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    fn record_read(&mut self, key: &str, version: Option<Version>) {
        self.reads.entry(key.to_string()).or_insert(version);
    }

    /// Finish the simulation and return what it read and wants to write.
    pub fn into_rwset(self) -> ReadWriteSet {
        ReadWriteSet {
            reads: self
                .reads
                .into_iter()
                .map(|(key, version)| KvRead { key, version })
                .collect(),
            writes: self
                .writes
                .into_iter()
                .map(|(key, value)| KvWrite { key, value })
                .collect(),
        }
    }
}

impl WorldState for TxSimulator<'_> {
    fn get_state(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let entry = self.committed.get(key)?;
        self.record_read(key, entry.as_ref().map(|v| v.version));
        Ok(entry.map(|v| v.value))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn range_scan(&mut self, start: &str, end: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let entries = self.committed.range(start, end)?;
        let mut out = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            self.record_read(&key, Some(value.version));
            out.push((key, value.value));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed() -> VersionedStore {
        let store = VersionedStore::new();
        store.apply(
            &[KvWrite {
                key: "a".into(),
                value: Some(b"1".to_vec()),
            }],
            Version::new(1, 0),
        );
        store
    }

    #[test]
    fn reads_record_versions() {
        let store = committed();
        let mut sim = TxSimulator::new(&store);
        assert_eq!(sim.get_state("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(sim.get_state("b").unwrap(), None);
        let rwset = sim.into_rwset();
        assert_eq!(
            rwset.reads,
            vec![
                KvRead { key: "a".into(), version: Some(Version::new(1, 0)) },
                KvRead { key: "b".into(), version: None },
            ]
        );
        assert!(rwset.is_read_only());
    }

    #[test]
    fn writes_are_buffered_not_visible() {
        let store = committed();
        let mut sim = TxSimulator::new(&store);
        sim.put_state("a", b"2".to_vec()).unwrap();
        assert_eq!(sim.get_state("a").unwrap(), Some(b"1".to_vec()));
        sim.delete_state("a").unwrap();
        let rwset = sim.into_rwset();
        assert_eq!(rwset.writes, vec![KvWrite { key: "a".into(), value: None }]);
        assert_eq!(store.get("a").unwrap().unwrap().value, b"1");
    }

    #[test]
    fn range_scan_records_each_key() {
        let store = committed();
        let mut sim = TxSimulator::new(&store);
        assert_eq!(sim.range_scan("", "").unwrap().len(), 1);
        assert_eq!(sim.into_rwset().reads.len(), 1);
    }
}
