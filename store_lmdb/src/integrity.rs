//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node begins
//! applying blocks.

use std::collections::BTreeMap;
use std::path::Path;

use tokenchain_store::keys::ALL_TAGS;

use crate::environment::LEDGER_DB;
use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub total_entries: u64,
    /// Entry count per record kind.
    pub entries_by_kind: BTreeMap<&'static str, u64>,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check LMDB database integrity on startup.
///
/// Walks the ledger database once and counts entries by tag. Read failures
/// and keys with an unknown tag are recorded in the report rather than
/// causing a hard error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env().read_txn()?;
    let db = env
        .env()
        .open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(LEDGER_DB))?
        .ok_or(LmdbError::MissingDatabase(LEDGER_DB))?;

    let mut unknown = 0u64;
    for entry in db.iter(&rtxn)? {
        let (key, _) = match entry {
            Ok(kv) => kv,
            Err(e) => {
                report.errors.push(format!("failed to read entry: {e}"));
                break;
            }
        };
        report.total_entries += 1;
        match key
            .first()
            .and_then(|tag| ALL_TAGS.iter().find(|(t, _)| t == tag))
        {
            Some((_, label)) => *report.entries_by_kind.entry(*label).or_default() += 1,
            None => unknown += 1,
        }
    }
    if unknown > 0 {
        report
            .errors
            .push(format!("{unknown} entries carry an unknown key tag"));
    }
    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbStore;
    use tokenchain_store::keys::{meta_key, unspent_key};
    use tokenchain_store::KvStore;
    use tokenchain_types::TxHash;

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("does-not-exist")).is_ok());
    }

    #[test]
    fn check_data_dir_missing_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn counts_entries_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).unwrap();
        store.put(&meta_key("tip"), b"x").unwrap();
        store.put(&unspent_key(&TxHash::ZERO), b"y").unwrap();
        store.put(&unspent_key(&TxHash::new([1; 32])), b"z").unwrap();

        let report = check_integrity(store.environment()).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.total_entries, 3);
        assert_eq!(report.entries_by_kind.get("unspent"), Some(&2));
        assert_eq!(report.entries_by_kind.get("meta"), Some(&1));
    }

    #[test]
    fn unknown_tag_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).unwrap();
        store.put(&[0x07, 1, 2], b"x").unwrap();
        let report = check_integrity(store.environment()).unwrap();
        assert!(!report.is_healthy());
    }
}
