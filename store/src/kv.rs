//! The key-value capability every backend provides.

use std::ops::ControlFlow;

use crate::{StoreError, WriteBatch};

/// Callback invoked for each entry of a prefix scan. Return
/// `ControlFlow::Break(())` to stop early.
pub type ScanVisitor<'a> =
    dyn FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, StoreError> + 'a;

/// Byte-keyed storage with prefix iteration and atomic batch commit.
///
/// Reads observe only committed state. A committed batch becomes visible to
/// readers all at once or not at all.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Visit entries whose key starts with `prefix`, in ascending key order,
    /// beginning strictly after `start_after` when given.
    fn scan_prefix_from(
        &self,
        prefix: &[u8],
        start_after: Option<&[u8]>,
        visit: &mut ScanVisitor<'_>,
    ) -> Result<(), StoreError>;

    /// Apply every operation of the batch atomically.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn scan_prefix(&self, prefix: &[u8], visit: &mut ScanVisitor<'_>) -> Result<(), StoreError> {
        self.scan_prefix_from(prefix, None, visit)
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        self.commit(batch)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(key);
        self.commit(batch)
    }

    /// Number of entries under a prefix.
    fn count_prefix(&self, prefix: &[u8]) -> Result<u64, StoreError> {
        let mut count = 0u64;
        self.scan_prefix(prefix, &mut |_, _| {
            count += 1;
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(count)
    }
}
