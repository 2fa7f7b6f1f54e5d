//! [`KvStore`] over the LMDB ledger database.
//!
//! A [`WriteBatch`] is replayed into one LMDB write transaction, so commit
//! is all-or-nothing and concurrent readers see either the old or the new
//! state.

use std::ops::{Bound, ControlFlow};
use std::path::Path;

use tokenchain_store::{BatchOp, KvStore, ScanVisitor, StoreError, WriteBatch};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

pub struct LmdbStore {
    env: LmdbEnvironment,
}

impl LmdbStore {
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        Ok(Self {
            env: LmdbEnvironment::open(path, map_size)?,
        })
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }
}

impl KvStore for LmdbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let value = self
            .env
            .ledger_db
            .get(&rtxn, key)
            .map_err(LmdbError::from)?
            .map(|v| v.to_vec());
        Ok(value)
    }

    fn scan_prefix_from(
        &self,
        prefix: &[u8],
        start_after: Option<&[u8]>,
        visit: &mut ScanVisitor<'_>,
    ) -> Result<(), StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let lower = match start_after {
            Some(start) if start >= prefix => Bound::Excluded(start),
            _ => Bound::Included(prefix),
        };
        let range: (Bound<&[u8]>, Bound<&[u8]>) = (lower, Bound::Unbounded);
        let iter = self
            .env
            .ledger_db
            .range(&rtxn, &range)
            .map_err(LmdbError::from)?;
        for entry in iter {
            let (key, value) = entry.map_err(LmdbError::from)?;
            if !key.starts_with(prefix) {
                break;
            }
            if visit(key, value)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let ops = batch.len();
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    self.env
                        .ledger_db
                        .put(&mut wtxn, &key, &value)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::Delete { key } => {
                    self.env
                        .ledger_db
                        .delete(&mut wtxn, &key)
                        .map_err(LmdbError::from)?;
                }
            }
        }
        // Dropping `wtxn` on an early return aborts the transaction.
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(ops, "committed write batch");
        Ok(())
    }
}
