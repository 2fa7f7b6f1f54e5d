//! Transaction pool: validated transactions waiting for a block.
//!
//! Admission runs the full validator against committed state, then rejects
//! transactions that spend an outpoint (or consume a deposit) already claimed
//! by another pooled transaction. Each pooled transaction carries its native
//! fee so block assembly can take the most profitable first.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokenchain_ledger::{FeeAccountant, FeeError, LedgerView};
use tokenchain_transactions::{Block, OutPoint, Transaction};
use tokenchain_types::{Fixed64, TxHash};
use tokenchain_validator::TransactionValidator;

use crate::NodeError;

#[derive(Default)]
struct PoolState {
    txs: HashMap<TxHash, Transaction>,
    /// Outpoint → pooled transaction spending it.
    claimed: HashMap<OutPoint, TxHash>,
    /// Foreign transaction hash → pooled deposit consuming it.
    deposits: HashMap<TxHash, TxHash>,
}

impl PoolState {
    fn remove(&mut self, hash: &TxHash) -> Option<Transaction> {
        let tx = self.txs.remove(hash)?;
        for outpoint in tx.outpoints() {
            self.claimed.remove(outpoint);
        }
        if let Some(payload) = tx.deposit_payload() {
            self.deposits.remove(&payload.foreign_tx_hash());
        }
        Some(tx)
    }
}

pub struct TxPool {
    state: Mutex<PoolState>,
    capacity: usize,
}

impl TxPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate `tx` against `view` and add it to the pool.
    ///
    /// Returns the transaction hash. The stored copy has its native fee set.
    pub fn admit(
        &self,
        mut tx: Transaction,
        validator: &TransactionValidator,
        view: &LedgerView<'_>,
    ) -> Result<TxHash, NodeError> {
        let hash = tx.hash();
        if self.contains(&hash) {
            return Err(NodeError::AlreadyPooled(hash));
        }
        validator.validate(&tx, view)?;
        let native = view.params().native_asset_id;
        let fee = FeeAccountant::new(view)
            .native_fee(&tx)?
            .to_fixed64()
            .ok_or(FeeError::Overflow(native))?;
        tx.set_fee(fee);

        let mut state = self.lock();
        if state.txs.contains_key(&hash) {
            return Err(NodeError::AlreadyPooled(hash));
        }
        if state.txs.len() >= self.capacity {
            return Err(NodeError::PoolFull(self.capacity));
        }
        for outpoint in tx.outpoints() {
            if let Some(holder) = state.claimed.get(outpoint) {
                return Err(NodeError::PoolConflict {
                    outpoint: *outpoint,
                    holder: *holder,
                });
            }
        }
        let foreign = tx.deposit_payload().map(|p| p.foreign_tx_hash());
        if let Some(foreign) = foreign {
            if let Some(holder) = state.deposits.get(&foreign) {
                return Err(NodeError::DepositConflict {
                    foreign,
                    holder: *holder,
                });
            }
            state.deposits.insert(foreign, hash);
        }
        for outpoint in tx.outpoints() {
            state.claimed.insert(*outpoint, hash);
        }
        state.txs.insert(hash, tx);
        tracing::debug!(tx = %hash, fee = %fee, pooled = state.txs.len(), "admitted transaction");
        Ok(hash)
    }

    /// Every pooled transaction, highest native fee first.
    pub fn get_all(&self) -> Vec<Transaction> {
        let state = self.lock();
        let mut txs: Vec<(TxHash, Transaction)> = state
            .txs
            .iter()
            .map(|(hash, tx)| (*hash, tx.clone()))
            .collect();
        txs.sort_by(|(ha, a), (hb, b)| {
            let fa = a.fee().unwrap_or(Fixed64::ZERO);
            let fb = b.fee().unwrap_or(Fixed64::ZERO);
            fb.cmp(&fa).then_with(|| ha.cmp(hb))
        });
        txs.into_iter().map(|(_, tx)| tx).collect()
    }

    pub fn get(&self, hash: &TxHash) -> Option<Transaction> {
        self.lock().txs.get(hash).cloned()
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.lock().txs.contains_key(hash)
    }

    /// Remove a transaction and release its outpoints.
    pub fn remove(&self, hash: &TxHash) -> Option<Transaction> {
        self.lock().remove(hash)
    }

    /// Drop transactions included in `block` and those conflicting with its
    /// spends or deposits. Returns the number removed.
    pub fn remove_confirmed(&self, block: &Block) -> usize {
        let mut state = self.lock();
        let mut doomed = Vec::new();
        for tx in &block.transactions {
            doomed.push(tx.hash());
            doomed.extend(tx.outpoints().filter_map(|o| state.claimed.get(o).copied()));
            if let Some(payload) = tx.deposit_payload() {
                doomed.extend(state.deposits.get(&payload.foreign_tx_hash()).copied());
            }
        }
        let removed = doomed
            .iter()
            .filter(|hash| state.remove(hash).is_some())
            .count();
        if removed > 0 {
            tracing::debug!(height = block.height(), removed, "pruned pool");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
