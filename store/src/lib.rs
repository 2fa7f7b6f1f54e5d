//! Abstract storage for the token sidechain.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`KvStore`]. The rest of the codebase depends only on the trait and the
//! key layout in [`keys`].

pub mod batch;
pub mod error;
pub mod keys;
pub mod kv;

pub use batch::{BatchOp, WriteBatch};
pub use error::StoreError;
pub use kv::{KvStore, ScanVisitor};
