//! Read-only queries over committed state.

use std::collections::BTreeMap;

use tokenchain_ledger::{AssetInfo, BucketCursor, LedgerError, UtxoPage};
use tokenchain_types::{AssetId, ProgramHash, SignedAmount, TxHash};

use crate::{Node, NodeError};

/// One spendable output of an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnspentInfo {
    pub tx_id: TxHash,
    pub index: u16,
    pub asset_id: AssetId,
    pub owner: ProgramHash,
    /// Decimal amount in the asset's internal scale.
    pub amount: String,
    /// Tip height minus creation height, plus one.
    pub confirmations: u32,
    pub output_lock: u32,
}

impl Node {
    /// Total unspent value per asset held by `owner`.
    pub fn balances(
        &self,
        owner: &ProgramHash,
    ) -> Result<BTreeMap<AssetId, SignedAmount>, NodeError> {
        let mut totals = BTreeMap::new();
        for (asset, records) in self.chain().owned_by(owner)? {
            let mut total = SignedAmount::ZERO;
            for record in &records {
                total = total
                    .checked_add(record.value.to_signed())
                    .ok_or(tokenchain_ledger::FeeError::Overflow(asset))?;
            }
            totals.insert(asset, total);
        }
        Ok(totals)
    }

    /// Unspent outputs of `owner`, optionally limited to one asset, ordered
    /// by asset then creation height.
    pub fn list_unspent(
        &self,
        owner: &ProgramHash,
        asset: Option<AssetId>,
    ) -> Result<Vec<UnspentInfo>, NodeError> {
        let view = self.chain().view();
        let best = view.height();
        let mut unspent = Vec::new();
        for bucket in view.buckets_of(owner)? {
            if asset.is_some_and(|a| a != bucket.asset_id) {
                continue;
            }
            for record in &bucket.records {
                let stored = view
                    .get_transaction(&record.tx_id)?
                    .ok_or(LedgerError::UnknownReference { tx: record.tx_id })?;
                let output_lock = stored
                    .tx
                    .outputs
                    .get(record.index as usize)
                    .map(|o| o.output_lock)
                    .ok_or(LedgerError::ReferenceOutOfRange {
                        outpoint: record.outpoint(),
                        outputs: stored.tx.outputs.len(),
                    })?;
                unspent.push(UnspentInfo {
                    tx_id: record.tx_id,
                    index: record.index,
                    asset_id: record.asset_id,
                    owner: *owner,
                    amount: record.value_string(),
                    confirmations: best.saturating_sub(bucket.height) + 1,
                    output_lock,
                });
            }
        }
        Ok(unspent)
    }

    pub fn get_asset(&self, id: &AssetId) -> Result<Option<AssetInfo>, NodeError> {
        Ok(self.chain().get_asset(id)?)
    }

    pub fn list_assets(&self) -> Result<Vec<(AssetId, AssetInfo)>, NodeError> {
        Ok(self.chain().list_assets()?)
    }

    /// One page of `owner`'s ownership buckets, resuming after `start_after`.
    pub fn owned_by_paged(
        &self,
        owner: &ProgramHash,
        start_after: Option<BucketCursor>,
        limit: usize,
    ) -> Result<UtxoPage, NodeError> {
        Ok(self.chain().view().owned_by_paged(owner, start_after, limit)?)
    }
}
