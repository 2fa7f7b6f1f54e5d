//! Read-your-writes overlay used while a block is being applied.
//!
//! All mutations of one block land here first. Nothing reaches the backing
//! store until [`PendingBatch::into_write_batch`] is committed, so dropping
//! the overlay discards a failed application entirely.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use tokenchain_store::{KvStore, StoreError, WriteBatch};

/// Reads used by the registry and the index, served either from committed
/// state or from a pending overlay.
pub(crate) trait KvRead {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every entry under `prefix`, in key order.
    fn read_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// Committed state only.
pub(crate) struct Committed<'a>(pub &'a dyn KvStore);

impl KvRead for Committed<'_> {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.0.get(key)
    }

    fn read_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut entries = Vec::new();
        self.0.scan_prefix(prefix, &mut |k, v| {
            entries.push((k.to_vec(), v.to_vec()));
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(entries)
    }
}

pub(crate) struct PendingBatch<'a> {
    base: &'a dyn KvStore,
    /// `None` marks a deletion.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> PendingBatch<'a> {
    pub fn new(base: &'a dyn KvStore) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    pub fn into_write_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (key, value) in self.writes {
            match value {
                Some(value) => batch.put(key, value),
                None => batch.delete(key),
            }
        }
        batch
    }
}

impl KvRead for PendingBatch<'_> {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.get(key),
        }
    }

    fn read_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            Committed(self.base).read_prefix(prefix)?.into_iter().collect();
        for (key, value) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenchain_nullables::NullStore;

    #[test]
    fn overlay_shadows_base() {
        let base = NullStore::new();
        base.put(b"a1", b"old").unwrap();
        base.put(b"a2", b"keep").unwrap();

        let mut pending = PendingBatch::new(&base);
        pending.put(b"a1".to_vec(), b"new".to_vec());
        pending.delete(b"a2".to_vec());
        pending.put(b"a3".to_vec(), b"added".to_vec());

        assert_eq!(pending.read(b"a1").unwrap(), Some(b"new".to_vec()));
        assert_eq!(pending.read(b"a2").unwrap(), None);
        let keys: Vec<_> = pending
            .read_prefix(b"a")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"a1".to_vec(), b"a3".to_vec()]);

        // Base is untouched until commit.
        assert_eq!(base.get(b"a1").unwrap(), Some(b"old".to_vec()));
        base.commit(pending.into_write_batch()).unwrap();
        assert_eq!(base.get(b"a2").unwrap(), None);
        assert_eq!(base.get(b"a3").unwrap(), Some(b"added".to_vec()));
    }
}
