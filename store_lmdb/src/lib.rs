//! LMDB storage backend for the token sidechain.
//!
//! Implements [`tokenchain_store::KvStore`] using the `heed` LMDB bindings.
//! All tagged records share one LMDB database within a single environment,
//! so a block's effects commit in one write transaction.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod migration;
pub mod store;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use store::LmdbStore;
