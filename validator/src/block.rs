//! Whole-block checks: coinbase placement, merkle root, reward accounting
//! and spends that collide across transactions.

use std::collections::HashSet;

use tokenchain_ledger::{FeeAccountant, FeeError, LedgerView};
use tokenchain_transactions::Block;
use tokenchain_types::{Fixed64, SignedAmount};

use crate::{TransactionValidator, ValidationError};

impl TransactionValidator {
    /// Validate `block` as the successor of the view's tip.
    ///
    /// Every transaction is checked against the state before the block, so a
    /// transaction may not spend an output created earlier in the same block.
    pub fn validate_block(
        &self,
        block: &Block,
        view: &LedgerView<'_>,
    ) -> Result<(), ValidationError> {
        let params = view.params();
        let txs = &block.transactions;
        let Some(coinbase) = txs.first() else {
            return Err(ValidationError::EmptyBlock);
        };
        if txs.len() > params.max_tx_per_block {
            return Err(ValidationError::TooManyTransactions {
                count: txs.len(),
                limit: params.max_tx_per_block,
            });
        }
        if !coinbase.is_coinbase() {
            return Err(ValidationError::MissingCoinbase);
        }
        if let Some(pos) = txs.iter().skip(1).position(|tx| tx.is_coinbase()) {
            return Err(ValidationError::CoinbaseMisplaced(pos + 1));
        }
        if block.header.merkle_root != block.computed_merkle_root() {
            return Err(ValidationError::MerkleMismatch);
        }

        let native = params.native_asset_id;
        let overflow = || ValidationError::Fee(FeeError::Overflow(native));
        let accountant = FeeAccountant::new(view);
        let mut hashes = HashSet::with_capacity(txs.len());
        let mut claimed = HashSet::new();
        let mut fees = SignedAmount::ZERO;

        for (position, tx) in txs.iter().enumerate() {
            let hash = tx.hash();
            if !hashes.insert(hash) {
                return Err(ValidationError::DuplicateTransaction(hash));
            }
            self.validate_sanity(tx, view)?;
            if position == 0 {
                continue;
            }
            self.validate_context(tx, view)?;
            for outpoint in tx.outpoints() {
                if !claimed.insert(*outpoint) {
                    return Err(ValidationError::DoubleSpend {
                        outpoint: *outpoint,
                    });
                }
            }
            fees = fees
                .checked_add(accountant.native_fee(tx)?)
                .ok_or_else(overflow)?;
        }

        let reward = coinbase
            .outputs
            .iter()
            .try_fold(Fixed64::ZERO, |acc, o| acc.checked_add(o.value))
            .ok_or_else(overflow)?;
        if SignedAmount::from(reward) != fees {
            return Err(ValidationError::RewardMismatch { reward, fees });
        }
        Ok(())
    }
}
