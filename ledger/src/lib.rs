//! Ledger core of the token sidechain.
//!
//! Unspent outputs carry either the native coin (eight decimals, `Fixed64`)
//! or a registered token (eighteen decimals, `U256`). The [`ChainStore`]
//! applies whole blocks to the asset registry and the unspent output index
//! in one atomic commit and can reverse the tip block exactly.
//! [`FeeAccountant`] computes per-asset fees against a [`LedgerView`].

pub mod asset_registry;
pub mod audit;
pub mod chain_store;
pub mod error;
pub mod fee;
mod pending;
pub mod records;
pub mod unspent_index;

pub use asset_registry::AssetRegistry;
pub use audit::AuditReport;
pub use chain_store::{ChainStore, LedgerView, ResolvedInput};
pub use error::{ErrorKind, LedgerError};
pub use fee::{FeeAccountant, FeeError, FeeMap};
pub use records::{AssetInfo, ChainTip, StoredTransaction, UtxoBucket, UtxoRecord, UtxoValue};
pub use unspent_index::{BucketCursor, Flow, UnspentIndex, UtxoPage};
