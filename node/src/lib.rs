//! Token sidechain node core.
//!
//! The node is the coordinator that:
//! - Opens and checks the ledger store
//! - Validates and applies incoming blocks, and rolls back the tip
//! - Holds validated transactions in a pool until they are included
//! - Answers balance, unspent output and asset queries

pub mod config;
pub mod error;
pub mod node;
pub mod pool;
pub mod query;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::Node;
pub use pool::TxPool;
pub use query::UnspentInfo;
