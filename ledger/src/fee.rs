//! Fee Accountant: per-asset balance between what a transaction consumes
//! and what it creates.
//!
//! Native amounts stay in the 10^-8 domain and token amounts in the 10^-18
//! domain; the two are never mixed within one asset's entry.

use std::collections::BTreeMap;

use thiserror::Error;
use tokenchain_transactions::{DepositPayload, Transaction, TransactionError};
use tokenchain_types::{AssetId, Fixed64, SignedAmount};

use crate::chain_store::LedgerView;
use crate::error::ErrorKind;
use crate::records::UtxoValue;
use crate::LedgerError;

pub type FeeMap = BTreeMap<AssetId, SignedAmount>;

#[derive(Debug, Error)]
pub enum FeeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("deposit payload: {0}")]
    Deposit(#[from] TransactionError),

    #[error("deposit transaction carries no deposit payload")]
    MissingDepositPayload,

    #[error("amount overflow while summing asset {0}")]
    Overflow(AssetId),
}

impl FeeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeeError::Ledger(e) => e.kind(),
            FeeError::Deposit(_) | FeeError::MissingDepositPayload => ErrorKind::Structural,
            FeeError::Overflow(_) => ErrorKind::Economic,
        }
    }
}

pub struct FeeAccountant<'v, 'a> {
    view: &'v LedgerView<'a>,
}

impl<'v, 'a> FeeAccountant<'v, 'a> {
    pub fn new(view: &'v LedgerView<'a>) -> Self {
        Self { view }
    }

    /// Inputs minus outputs, per asset.
    ///
    /// Assets only on the output side come out negative; assets only on the
    /// input side come out as their full input value.
    pub fn fee_by_asset(&self, tx: &Transaction) -> Result<FeeMap, FeeError> {
        if tx.is_deposit() {
            let deposit = tx
                .deposit_payload()
                .ok_or(FeeError::MissingDepositPayload)?;
            return self.deposit_fee(tx, deposit);
        }

        let native = self.view.params().native_asset_id;
        let mut fees = FeeMap::new();
        for resolved in self.view.resolve_inputs(tx)? {
            let value = UtxoValue::of_output(&resolved.output, &native).to_signed();
            accumulate(&mut fees, resolved.output.asset_id, value)?;
        }
        for output in &tx.outputs {
            let value = UtxoValue::of_output(output, &native).to_signed();
            accumulate(&mut fees, output.asset_id, -value)?;
        }
        Ok(fees)
    }

    /// Fee in the native asset; zero when the transaction does not touch it.
    pub fn native_fee(&self, tx: &Transaction) -> Result<SignedAmount, FeeError> {
        let native = self.view.params().native_asset_id;
        Ok(self
            .fee_by_asset(tx)?
            .get(&native)
            .copied()
            .unwrap_or(SignedAmount::ZERO))
    }

    /// A deposit's input side is the main chain amount funding each local
    /// output, converted at the configured exchange rate.
    fn deposit_fee(&self, tx: &Transaction, deposit: &DepositPayload) -> Result<FeeMap, FeeError> {
        let foreign = deposit.decode_foreign()?;
        let rate = self.view.params().exchange_rate;
        let mut fees = FeeMap::new();
        for output in &tx.outputs {
            let address = output.program_hash.to_address();
            for (i, target) in foreign.payload.cross_chain_addresses.iter().enumerate() {
                if *target != address {
                    continue;
                }
                let main_chain = foreign.target_amount(i)?;
                let converted = convert_at_rate(main_chain, rate)
                    .ok_or(FeeError::Overflow(output.asset_id))?;
                accumulate(&mut fees, output.asset_id, converted.into())?;
                accumulate(&mut fees, output.asset_id, -SignedAmount::from(output.value))?;
            }
        }
        Ok(fees)
    }
}

/// Scale a main chain amount by `rate`, truncating toward zero.
///
/// The product is taken in `f64`, so raw amounts above 2^53 lose their low
/// digits. A product outside the `i64` range is `None`.
fn convert_at_rate(amount: Fixed64, rate: f64) -> Option<Fixed64> {
    let scaled = (amount.raw() as f64 * rate).trunc();
    // i64::MAX rounds up to 2^63 as an f64, so that bound is exclusive.
    if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
        Some(Fixed64::new(scaled as i64))
    } else {
        None
    }
}

fn accumulate(fees: &mut FeeMap, asset: AssetId, amount: SignedAmount) -> Result<(), FeeError> {
    let entry = fees.entry(asset).or_insert(SignedAmount::ZERO);
    *entry = entry
        .checked_add(amount)
        .ok_or(FeeError::Overflow(asset))?;
    Ok(())
}
