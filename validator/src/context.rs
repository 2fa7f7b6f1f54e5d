//! Checks against committed ledger state, in the order they run.

use std::collections::HashSet;

use tokenchain_ledger::{FeeAccountant, LedgerError, UtxoValue};
use tokenchain_transactions::{Transaction, LOCKED_INPUT_SEQUENCE};
use tokenchain_types::address::{PREFIX_CROSS_CHAIN, PREFIX_MULTISIG, PREFIX_STANDARD};
use tokenchain_types::{
    token_string, ProgramHash, SignedAmount, NATIVE_PRECISION, TOKEN_PRECISION, U256,
};

use crate::check::{CheckContext, ContextCheck};
use crate::ValidationError;

/// Native amounts scale to the eighteen-decimal token domain by this power.
const NATIVE_TO_TOKEN_EXP: usize = (TOKEN_PRECISION - NATIVE_PRECISION) as usize;

pub struct DuplicateHash;

impl ContextCheck for DuplicateHash {
    fn name(&self) -> &'static str {
        "duplicate_hash"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let hash = tx.hash();
        if cx.view.contains_transaction(&hash)? {
            return Err(ValidationError::DuplicateTransaction(hash));
        }
        Ok(())
    }
}

/// Coinbases only enter the chain inside a block.
pub struct CoinbaseSubmission;

impl ContextCheck for CoinbaseSubmission {
    fn name(&self) -> &'static str {
        "coinbase_submission"
    }

    fn check(&self, tx: &Transaction, _cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        if tx.is_coinbase() {
            return Err(ValidationError::CoinbaseNotSubmittable);
        }
        Ok(())
    }
}

pub struct ProgramSignatures;

impl ContextCheck for ProgramSignatures {
    fn name(&self) -> &'static str {
        "program_signatures"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        if !cx.verifier.verify(tx) {
            return Err(ValidationError::SignatureRejected);
        }
        Ok(())
    }
}

/// The embedded main chain transaction decodes and has not been claimed.
pub struct DepositReplay;

impl ContextCheck for DepositReplay {
    fn name(&self) -> &'static str {
        "deposit_replay"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let Some(deposit) = tx.deposit_payload() else {
            return Ok(());
        };
        deposit.decode_foreign()?;
        let foreign = deposit.foreign_tx_hash();
        if cx.view.is_deposit_consumed(&foreign)? {
            return Err(ValidationError::DepositReplay(foreign));
        }
        Ok(())
    }
}

/// Each withdrawal target is a main chain address, funded by a distinct
/// cross-chain output that covers the amount plus the cross-chain fee.
pub struct WithdrawalRules;

impl ContextCheck for WithdrawalRules {
    fn name(&self) -> &'static str {
        "withdrawal_rules"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let Some(withdrawal) = tx.withdrawal_payload() else {
            return Ok(());
        };
        if !withdrawal.lists_consistent() {
            return Err(ValidationError::WithdrawalListMismatch);
        }

        let mut indexes = HashSet::new();
        for &index in &withdrawal.output_indexes {
            if index as usize >= tx.outputs.len() || !indexes.insert(index) {
                return Err(invalid_withdrawal(format!("bad output index {index}")));
            }
        }

        let cross_chain_outputs = tx
            .outputs
            .iter()
            .filter(|o| o.program_hash.prefix() == PREFIX_CROSS_CHAIN)
            .count();
        if cross_chain_outputs != withdrawal.cross_chain_addresses.len() {
            return Err(invalid_withdrawal(format!(
                "{} targets but {cross_chain_outputs} cross-chain outputs",
                withdrawal.cross_chain_addresses.len()
            )));
        }

        for address in &withdrawal.cross_chain_addresses {
            let target = ProgramHash::from_address(address)
                .map_err(|_| invalid_withdrawal(format!("bad target address {address:?}")))?;
            if !matches!(target.prefix(), PREFIX_STANDARD | PREFIX_MULTISIG) {
                return Err(invalid_withdrawal(format!(
                    "target {address} is not a standard or multisig address"
                )));
            }
        }

        let fee = cx.params().min_cross_chain_tx_fee;
        for (&index, &amount) in withdrawal
            .output_indexes
            .iter()
            .zip(&withdrawal.cross_chain_amounts)
        {
            let output = &tx.outputs[index as usize];
            if output.program_hash.prefix() != PREFIX_CROSS_CHAIN {
                return Err(invalid_withdrawal(format!(
                    "output {index} is not a cross-chain output"
                )));
            }
            let ceiling = output.value.checked_sub(fee);
            if amount.raw() < 0 || ceiling.map_or(true, |c| amount > c) {
                return Err(invalid_withdrawal(format!(
                    "amount {amount} exceeds output {index} less fee"
                )));
            }
        }
        Ok(())
    }
}

fn invalid_withdrawal(reason: String) -> ValidationError {
    ValidationError::InvalidWithdrawal(reason)
}

/// ASCII metadata, a free name, and a minted supply paid to the controller
/// that matches the declared amount.
pub struct AssetRegistration;

impl ContextCheck for AssetRegistration {
    fn name(&self) -> &'static str {
        "asset_registration"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let Some(registration) = tx.register_asset_payload() else {
            return Ok(());
        };
        let asset = &registration.asset;
        if !asset.name.is_ascii() || !asset.description.is_ascii() {
            return Err(ValidationError::NonAsciiAsset);
        }
        if cx.view.asset_name_exists(&asset.name)? {
            return Err(ValidationError::AssetNameTaken(asset.name.clone()));
        }

        let id = asset.id();
        let mut minted = U256::zero();
        for (index, output) in tx.outputs.iter().enumerate() {
            if output.asset_id != id {
                continue;
            }
            if output.program_hash != registration.controller {
                return Err(ValidationError::RegistrationController { index });
            }
            minted = minted.checked_add(output.token_value).ok_or_else(|| {
                ValidationError::RegistrationAmount {
                    expected: registration.amount.to_string(),
                    actual: "overflow".to_string(),
                }
            })?;
        }

        let declared = registration.amount.raw();
        let expected = u64::try_from(declared)
            .ok()
            .map(|raw| U256::from(raw) * U256::exp10(NATIVE_TO_TOKEN_EXP));
        if expected != Some(minted) {
            return Err(ValidationError::RegistrationAmount {
                expected: registration.amount.to_string(),
                actual: token_string(&minted),
            });
        }
        Ok(())
    }
}

/// Every referenced output exists and is still unspent.
pub struct DoubleSpend;

impl ContextCheck for DoubleSpend {
    fn name(&self) -> &'static str {
        "double_spend"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        for input in &tx.inputs {
            let outpoint = input.previous;
            let stored = cx
                .view
                .get_transaction(&outpoint.tx_id)?
                .ok_or(LedgerError::UnknownReference { tx: outpoint.tx_id })?;
            let outputs = stored.tx.outputs.len();
            if usize::from(outpoint.index) >= outputs {
                return Err(LedgerError::ReferenceOutOfRange { outpoint, outputs }.into());
            }
            if !cx.view.is_unspent(&outpoint)? {
                return Err(ValidationError::DoubleSpend { outpoint });
            }
        }
        Ok(())
    }
}

/// Output locks and coinbase maturity.
///
/// A locked output is spendable by an input carrying the locked sequence
/// from a transaction whose lock time has reached the output lock and is
/// final at the next height. A coinbase output needs `spend_coinbase_span`
/// blocks on top of the one that created it.
pub struct TimeLock;

impl ContextCheck for TimeLock {
    fn name(&self) -> &'static str {
        "time_lock"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let height = cx.view.height();
        let required = cx.params().spend_coinbase_span;
        let resolved = cx.view.resolve_inputs(tx)?;

        for (input, spent) in tx.inputs.iter().zip(&resolved) {
            let outpoint = spent.outpoint;
            let lock = spent.output.output_lock;
            if lock > 0 {
                if input.sequence != LOCKED_INPUT_SEQUENCE {
                    return Err(ValidationError::InvalidInputSequence { outpoint });
                }
                if tx.lock_time < lock || tx.lock_time > height.saturating_add(1) {
                    return Err(ValidationError::OutputLocked { outpoint, lock });
                }
            }
            if spent.from_coinbase {
                let confirmations = height.saturating_sub(spent.height);
                if confirmations < required {
                    return Err(ValidationError::IneffectiveCoinbase {
                        outpoint,
                        confirmations,
                        required,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Native fee covers the minimum for the transaction type; other assets
/// balance exactly, except the asset a minting type registers.
pub struct Balance;

impl ContextCheck for Balance {
    fn name(&self) -> &'static str {
        "balance"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let params = cx.params();
        let fees = FeeAccountant::new(cx.view).fee_by_asset(tx)?;

        let native = fees
            .get(&params.native_asset_id)
            .copied()
            .unwrap_or(SignedAmount::ZERO);
        let required = params.min_fee_for(tx.tx_type);
        if native < SignedAmount::from(required) {
            return Err(ValidationError::InsufficientFee {
                required,
                actual: native,
            });
        }

        let minted = tx
            .register_asset_payload()
            .filter(|_| params.may_mint_tokens(tx.tx_type))
            .map(|registration| registration.asset.id());
        for (asset, fee) in &fees {
            if params.is_native(asset) || minted == Some(*asset) {
                continue;
            }
            if !fee.is_zero() {
                return Err(ValidationError::TokenImbalance {
                    asset: *asset,
                    fee: *fee,
                });
            }
        }
        Ok(())
    }
}

/// A stored output with no value means the ledger is corrupt.
pub struct ReferencedOutputValue;

impl ContextCheck for ReferencedOutputValue {
    fn name(&self) -> &'static str {
        "referenced_output_value"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let native = cx.params().native_asset_id;
        for spent in cx.view.resolve_inputs(tx)? {
            if !UtxoValue::of_output(&spent.output, &native).is_positive() {
                return Err(ValidationError::InvalidReferencedOutput {
                    outpoint: spent.outpoint,
                });
            }
        }
        Ok(())
    }
}

