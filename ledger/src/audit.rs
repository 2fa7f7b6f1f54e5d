//! Consistency audit between the two unspent output indices.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use tokenchain_store::keys::{decode_unspent_key, decode_utxo_bucket_key, UNSPENT, UTXO};
use tokenchain_transactions::OutPoint;

use crate::chain_store::{ChainStore, LedgerView};
use crate::error::decode;
use crate::records::UtxoRecord;
use crate::LedgerError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub buckets: u64,
    pub bucket_records: u64,
    pub unspent_outputs: u64,
    /// In an ownership bucket but not in the per-transaction index.
    pub missing_from_unspent: Vec<OutPoint>,
    /// In the per-transaction index but in no ownership bucket.
    pub missing_from_buckets: Vec<OutPoint>,
    /// Present in more than one ownership bucket.
    pub duplicated: Vec<OutPoint>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_from_unspent.is_empty()
            && self.missing_from_buckets.is_empty()
            && self.duplicated.is_empty()
    }
}

impl LedgerView<'_> {
    /// Walk both indices and report every output on which they disagree.
    pub fn audit_unspent_index(&self) -> Result<AuditReport, LedgerError> {
        let mut report = AuditReport::default();

        let mut in_buckets = BTreeSet::new();
        self.kv().scan_prefix(&[UTXO], &mut |key, value| {
            decode_utxo_bucket_key(key)?;
            let records: Vec<UtxoRecord> = decode(value)?;
            report.buckets += 1;
            for record in records {
                report.bucket_records += 1;
                if !in_buckets.insert(record.outpoint()) {
                    report.duplicated.push(record.outpoint());
                }
            }
            Ok(ControlFlow::Continue(()))
        })?;

        let mut in_unspent = BTreeSet::new();
        self.kv().scan_prefix(&[UNSPENT], &mut |key, value| {
            let tx_id = decode_unspent_key(key)?;
            let indices: Vec<u16> = decode(value)?;
            for index in indices {
                report.unspent_outputs += 1;
                in_unspent.insert(OutPoint::new(tx_id, index));
            }
            Ok(ControlFlow::Continue(()))
        })?;

        report.missing_from_unspent = in_buckets.difference(&in_unspent).copied().collect();
        report.missing_from_buckets = in_unspent.difference(&in_buckets).copied().collect();
        if !report.is_consistent() {
            tracing::warn!(
                missing_from_unspent = report.missing_from_unspent.len(),
                missing_from_buckets = report.missing_from_buckets.len(),
                duplicated = report.duplicated.len(),
                "unspent output indices disagree"
            );
        }
        Ok(report)
    }
}

impl ChainStore {
    pub fn audit_unspent_index(&self) -> Result<AuditReport, LedgerError> {
        self.view().audit_unspent_index()
    }
}
