//! Stateless checks on a single transaction.

use std::collections::HashSet;

use tokenchain_transactions::{Transaction, MAX_OUTPUTS};
use tokenchain_types::{ChainParams, Fixed64, TxType, NATIVE_PRECISION, TOKEN_PRECISION, U256};

use crate::check::{CheckContext, SanityCheck};
use crate::ValidationError;

/// Payload agrees with the declared type; input and output counts fit; no
/// input appears twice; withdrawal lists line up.
pub struct TransactionShape;

impl SanityCheck for TransactionShape {
    fn name(&self) -> &'static str {
        "transaction_shape"
    }

    fn check(&self, tx: &Transaction, _cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let payload = tx.payload.tx_type();
        if tx.tx_type != payload {
            return Err(ValidationError::PayloadMismatch {
                tx_type: tx.tx_type,
                payload,
            });
        }

        match tx.tx_type {
            TxType::Coinbase | TxType::Deposit => {
                if !tx.inputs.is_empty() {
                    return Err(ValidationError::UnexpectedInputs(tx.tx_type));
                }
            }
            _ => {
                if tx.inputs.is_empty() {
                    return Err(ValidationError::NoInputs);
                }
            }
        }

        if tx.outputs.len() > MAX_OUTPUTS {
            return Err(ValidationError::TooManyOutputs {
                count: tx.outputs.len(),
                limit: MAX_OUTPUTS,
            });
        }

        let mut seen = HashSet::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            if !seen.insert(input.previous) {
                return Err(ValidationError::DoubleSpend {
                    outpoint: input.previous,
                });
            }
        }

        if let Some(withdrawal) = tx.withdrawal_payload() {
            if !withdrawal.lists_consistent() {
                return Err(ValidationError::WithdrawalListMismatch);
            }
        }
        Ok(())
    }
}

/// Output counts, the foundation share of a coinbase, value fields and
/// recipient classes.
pub struct OutputRules;

impl SanityCheck for OutputRules {
    fn name(&self) -> &'static str {
        "output_rules"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let params = cx.params();
        if tx.is_coinbase() {
            return check_coinbase_outputs(tx, params);
        }
        if tx.outputs.is_empty() {
            return Err(ValidationError::NoOutputs);
        }

        let cross_chain = tx.tx_type.is_cross_chain();
        for (index, output) in tx.outputs.iter().enumerate() {
            let asset = output.asset_id;
            if asset.is_zero() {
                return Err(ValidationError::UnknownAsset { index, asset });
            }
            if params.is_native(&asset) {
                if output.value.raw() < 0 || !output.token_value.is_zero() {
                    return Err(ValidationError::InvalidOutputValue { index, asset });
                }
            } else {
                if cross_chain {
                    return Err(ValidationError::CrossChainTokenOutput { index });
                }
                if !output.value.is_zero() {
                    return Err(ValidationError::InvalidOutputValue { index, asset });
                }
            }
            if !output.program_hash.is_valid_recipient() {
                return Err(ValidationError::InvalidRecipient { index });
            }
        }
        Ok(())
    }
}

/// At least two outputs, all native and non-negative to valid recipients,
/// and the foundation receives at least 30% of the total.
fn check_coinbase_outputs(tx: &Transaction, params: &ChainParams) -> Result<(), ValidationError> {
    if tx.outputs.len() < 2 {
        return Err(ValidationError::CoinbaseOutputs(tx.outputs.len()));
    }
    let mut total: i128 = 0;
    let mut foundation: i128 = 0;
    for (index, output) in tx.outputs.iter().enumerate() {
        let asset = output.asset_id;
        if !params.is_native(&asset) {
            return Err(ValidationError::CoinbaseTokenOutput { index, asset });
        }
        if output.value.raw() < 0 || !output.token_value.is_zero() {
            return Err(ValidationError::InvalidOutputValue { index, asset });
        }
        if !output.program_hash.is_valid_recipient() {
            return Err(ValidationError::InvalidRecipient { index });
        }
        total += i128::from(output.value.raw());
        if output.program_hash == params.foundation {
            foundation += i128::from(output.value.raw());
        }
    }
    if foundation * 10 < total * 3 {
        return Err(ValidationError::FoundationReward {
            foundation: Fixed64::new(foundation as i64),
            total: Fixed64::new(total as i64),
        });
    }
    Ok(())
}

/// Every output uses a registered asset and no granularity finer than the
/// asset declares. A registration's own minted outputs are judged against
/// the precision it declares.
pub struct AssetPrecision;

impl SanityCheck for AssetPrecision {
    fn name(&self) -> &'static str {
        "asset_precision"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let params = cx.params();
        let registering = tx
            .register_asset_payload()
            .map(|p| (p.asset.id(), p.asset.precision));

        for (index, output) in tx.outputs.iter().enumerate() {
            let asset = output.asset_id;
            let precision = match registering {
                Some((id, precision)) if id == asset => precision,
                _ => match cx.view.get_asset(&asset)? {
                    Some(info) => info.precision,
                    None => return Err(ValidationError::UnknownAsset { index, asset }),
                },
            };
            let precise = if params.is_native(&asset) {
                native_amount_precise(output.value, precision)
            } else {
                token_amount_precise(&output.token_value, precision)
            };
            if !precise {
                return Err(ValidationError::InvalidPrecision { index, precision });
            }
        }
        Ok(())
    }
}

/// Registration precision bounds, and the native precision rule for the
/// genesis registration of the native asset.
pub struct PayloadRules;

impl SanityCheck for PayloadRules {
    fn name(&self) -> &'static str {
        "payload_rules"
    }

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError> {
        let Some(registration) = tx.register_asset_payload() else {
            return Ok(());
        };
        let params = cx.params();
        let precision = registration.asset.precision;
        if precision < params.min_precision || precision > TOKEN_PRECISION {
            return Err(ValidationError::InvalidAssetPrecision(precision));
        }
        if params.is_native(&tx.hash().into())
            && !native_amount_precise(registration.amount, precision)
        {
            return Err(ValidationError::InvalidAssetPrecision(precision));
        }
        Ok(())
    }
}

/// Whether a native amount is a whole multiple of `10^-precision`.
pub fn native_amount_precise(amount: Fixed64, precision: u8) -> bool {
    if precision >= NATIVE_PRECISION {
        return true;
    }
    let step = 10i64.pow(u32::from(NATIVE_PRECISION - precision));
    amount.raw() % step == 0
}

/// Whether a token amount, held at eighteen decimals, is a whole multiple of
/// `10^-precision`.
pub fn token_amount_precise(amount: &U256, precision: u8) -> bool {
    if precision >= TOKEN_PRECISION {
        return true;
    }
    let step = U256::exp10(usize::from(TOKEN_PRECISION - precision));
    (*amount % step).is_zero()
}
