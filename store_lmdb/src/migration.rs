//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta namespace
//! and runs sequential migration functions to bring an older database up
//! to date.

use tokenchain_store::keys::{meta_key, META_SCHEMA_VERSION};
use tokenchain_store::{KvStore, StoreError};

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - If the stored version is *higher* than what this code supports,
    ///   the database was written by a newer node and we refuse to open it.
    pub fn run(store: &dyn KvStore) -> Result<u32, LmdbError> {
        let current = schema_version(store).map_err(|e| LmdbError::Schema(e.to_string()))?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(current);
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Schema(format!(
                "database schema version {} is newer than supported version {}",
                current, CURRENT_SCHEMA_VERSION
            )));
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        store
            .put(
                &meta_key(META_SCHEMA_VERSION),
                &CURRENT_SCHEMA_VERSION.to_le_bytes(),
            )
            .map_err(|e| LmdbError::Schema(e.to_string()))?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(CURRENT_SCHEMA_VERSION)
    }
}

/// Read the stored schema version; 0 when none is stored.
pub fn schema_version(store: &dyn KvStore) -> Result<u32, StoreError> {
    match store.get(&meta_key(META_SCHEMA_VERSION))? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                StoreError::Serialization("schema_version has unexpected byte length".into())
            })?;
            Ok(u32::from_le_bytes(arr))
        }
        None => Ok(0),
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: nothing to migrate from a blank slate.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Schema(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbStore;

    fn temp_store() -> (tempfile::TempDir, LmdbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).unwrap();
        (dir, store)
    }

    #[test]
    fn unknown_migration_is_error() {
        assert!(run_migration(99, 100).is_err());
    }

    #[test]
    fn fresh_database_is_stamped() {
        let (_dir, store) = temp_store();
        assert_eq!(schema_version(&store).unwrap(), 0);
        assert_eq!(Migrator::run(&store).unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(schema_version(&store).unwrap(), CURRENT_SCHEMA_VERSION);
        // Second run is a no-op.
        assert_eq!(Migrator::run(&store).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let (_dir, store) = temp_store();
        store
            .put(&meta_key(META_SCHEMA_VERSION), &99u32.to_le_bytes())
            .unwrap();
        assert!(matches!(Migrator::run(&store), Err(LmdbError::Schema(_))));
    }
}
