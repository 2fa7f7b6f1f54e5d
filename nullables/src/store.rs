//! Nullable store: thread-safe in-memory key-value storage for testing.

use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokenchain_store::{BatchOp, KvStore, ScanVisitor, StoreError, WriteBatch};

/// An in-memory [`KvStore`] backed by an ordered map.
///
/// Commits can be made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct NullStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    fail_next_commit: AtomicBool,
    commits: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit` fail without applying anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Copy of every stored entry, for state comparisons in tests.
    pub fn dump(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for NullStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn scan_prefix_from(
        &self,
        prefix: &[u8],
        start_after: Option<&[u8]>,
        visit: &mut ScanVisitor<'_>,
    ) -> Result<(), StoreError> {
        // Snapshot the range so the visitor may call back into the store.
        let lower = match start_after {
            Some(start) if start >= prefix => Bound::Excluded(start.to_vec()),
            _ => Bound::Included(prefix.to_vec()),
        };
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = self
            .lock()
            .range((lower, Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in snapshot {
            if visit(&key, &value)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut entries = self.lock();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
