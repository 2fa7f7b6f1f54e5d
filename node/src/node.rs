//! The node: wires storage, the chain store, the validator and the pool.
//!
//! Blocks arrive fully formed. [`Node::accept_block`] validates a block
//! against the committed tip and applies it in one atomic commit;
//! [`Node::rollback_tip`] undoes the most recent block.

use std::sync::Arc;

use tokenchain_ledger::{ChainStore, ChainTip};
use tokenchain_store::KvStore;
use tokenchain_store_lmdb::{check_data_dir, check_integrity, LmdbStore, Migrator};
use tokenchain_transactions::{Block, Transaction};
use tokenchain_types::TxHash;
use tokenchain_validator::{ProgramVerifier, TransactionValidator};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::pool::TxPool;

pub struct Node {
    config: NodeConfig,
    chain: ChainStore,
    validator: TransactionValidator,
    pool: TxPool,
}

impl Node {
    /// Open the LMDB store under `config.data_dir`, check it and bring its
    /// schema up to date.
    pub fn open(config: NodeConfig, verifier: Arc<dyn ProgramVerifier>) -> Result<Self, NodeError> {
        check_data_dir(&config.data_dir).map_err(|e| NodeError::Integrity(vec![e]))?;
        let store = LmdbStore::open(&config.data_dir, config.map_size)?;

        let report = check_integrity(store.environment())?;
        if !report.is_healthy() {
            return Err(NodeError::Integrity(report.errors));
        }
        let version = Migrator::run(&store)?;
        tracing::info!(
            path = %config.data_dir.display(),
            entries = report.total_entries,
            schema = version,
            "opened ledger store"
        );
        Self::with_store(config, Arc::new(store), verifier)
    }

    /// Build a node over an already opened store.
    pub fn with_store(
        config: NodeConfig,
        kv: Arc<dyn KvStore>,
        verifier: Arc<dyn ProgramVerifier>,
    ) -> Result<Self, NodeError> {
        let chain = ChainStore::open(kv, config.chain.clone())?;
        let pool = TxPool::new(config.pool_capacity);
        Ok(Self {
            config,
            chain,
            validator: TransactionValidator::new(verifier),
            pool,
        })
    }

    /// Apply `genesis` to an empty chain without validating it.
    ///
    /// Returns `false` if the chain already starts with this genesis block.
    pub fn initialize(&self, genesis: &Block) -> Result<bool, NodeError> {
        let expected = genesis.hash();
        if self.chain.tip().is_some() {
            let stored = self
                .chain
                .view()
                .block_hash_at(0)?
                .ok_or(NodeError::NotInitialized)?;
            if stored != expected {
                return Err(NodeError::GenesisMismatch { stored, expected });
            }
            return Ok(false);
        }
        self.chain.apply_block(genesis)?;
        tracing::info!(hash = %expected, txs = genesis.transactions.len(), "applied genesis block");
        Ok(true)
    }

    /// Validate `block` as the successor of the tip, then apply it.
    pub fn accept_block(&self, block: &Block) -> Result<(), NodeError> {
        if self.chain.tip().is_none() {
            return Err(NodeError::NotInitialized);
        }
        {
            let view = self.chain.view();
            self.validator
                .validate_block(block, &view)
                .inspect_err(|e| {
                    tracing::warn!(height = block.height(), error = %e, "rejected block");
                })?;
        }
        self.chain.apply_block(block)?;
        let pruned = self.pool.remove_confirmed(block);
        tracing::info!(
            height = block.height(),
            hash = %block.hash(),
            txs = block.transactions.len(),
            pruned,
            "accepted block"
        );
        Ok(())
    }

    /// Undo the tip block and return it. The genesis block cannot be undone.
    pub fn rollback_tip(&self) -> Result<Block, NodeError> {
        let tip = self.chain.tip().ok_or(NodeError::NotInitialized)?;
        let block = self
            .chain
            .view()
            .get_block(&tip.hash)?
            .ok_or(NodeError::BlockNotFound(tip.hash))?;
        self.chain.unapply_block(&block)?;
        tracing::info!(height = tip.height, hash = %tip.hash, "rolled back block");
        Ok(block)
    }

    /// Validate `tx` against the tip and add it to the pool.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<TxHash, NodeError> {
        let hash = tx.hash();
        let view = self.chain.view();
        self.pool
            .admit(tx, &self.validator, &view)
            .inspect_err(|e| tracing::warn!(tx = %hash, error = %e, "rejected transaction"))
    }

    pub fn tip(&self) -> Option<ChainTip> {
        self.chain.tip()
    }

    pub fn chain(&self) -> &ChainStore {
        &self.chain
    }

    pub fn validator(&self) -> &TransactionValidator {
        &self.validator
    }

    pub fn pool(&self) -> &TxPool {
        &self.pool
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}
