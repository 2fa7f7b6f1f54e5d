//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Name of the single database holding every tagged record.
pub const LEDGER_DB: &str = "ledger";

const MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and the ledger database handle.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) ledger_db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process for this path and
        // the memory map is never modified outside of LMDB.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let ledger_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(LEDGER_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            ledger_db,
            path: path.to_path_buf(),
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
