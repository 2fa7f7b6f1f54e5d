//! Transaction and block validation for the token sidechain.
//!
//! A [`TransactionValidator`] runs two ordered chains of checks. The sanity
//! chain judges a transaction on its own; the context chain judges it
//! against a [`LedgerView`]. The first failing check ends validation and
//! nothing is mutated either way.

pub mod block;
pub mod check;
pub mod context;
pub mod error;
pub mod sanity;

use std::sync::Arc;

use tokenchain_ledger::LedgerView;
use tokenchain_transactions::Transaction;

pub use check::{CheckContext, ContextCheck, SanityCheck};
pub use error::ValidationError;
pub use tokenchain_transactions::ProgramVerifier;

pub struct TransactionValidator {
    sanity: Vec<Box<dyn SanityCheck>>,
    context: Vec<Box<dyn ContextCheck>>,
    verifier: Arc<dyn ProgramVerifier>,
}

impl TransactionValidator {
    /// The standard check chains.
    pub fn new(verifier: Arc<dyn ProgramVerifier>) -> Self {
        Self::with_checks(verifier, default_sanity_checks(), default_context_checks())
    }

    pub fn with_checks(
        verifier: Arc<dyn ProgramVerifier>,
        sanity: Vec<Box<dyn SanityCheck>>,
        context: Vec<Box<dyn ContextCheck>>,
    ) -> Self {
        Self {
            sanity,
            context,
            verifier,
        }
    }

    pub fn validate_sanity(
        &self,
        tx: &Transaction,
        view: &LedgerView<'_>,
    ) -> Result<(), ValidationError> {
        let cx = self.context_for(view);
        for check in &self.sanity {
            check
                .check(tx, &cx)
                .inspect_err(|e| rejected(check.name(), tx, e))?;
        }
        Ok(())
    }

    pub fn validate_context(
        &self,
        tx: &Transaction,
        view: &LedgerView<'_>,
    ) -> Result<(), ValidationError> {
        let cx = self.context_for(view);
        for check in &self.context {
            check
                .check(tx, &cx)
                .inspect_err(|e| rejected(check.name(), tx, e))?;
        }
        Ok(())
    }

    /// Sanity followed by context validation.
    pub fn validate(
        &self,
        tx: &Transaction,
        view: &LedgerView<'_>,
    ) -> Result<(), ValidationError> {
        self.validate_sanity(tx, view)?;
        self.validate_context(tx, view)
    }

    fn context_for<'v, 'a>(&'v self, view: &'v LedgerView<'a>) -> CheckContext<'v, 'a> {
        CheckContext {
            view,
            verifier: self.verifier.as_ref(),
        }
    }
}

fn rejected(check: &str, tx: &Transaction, error: &ValidationError) {
    tracing::debug!(check, tx = %tx.hash(), %error, "check failed");
}

pub fn default_sanity_checks() -> Vec<Box<dyn SanityCheck>> {
    vec![
        Box::new(sanity::TransactionShape),
        Box::new(sanity::OutputRules),
        Box::new(sanity::AssetPrecision),
        Box::new(sanity::PayloadRules),
    ]
}

pub fn default_context_checks() -> Vec<Box<dyn ContextCheck>> {
    vec![
        Box::new(context::DuplicateHash),
        Box::new(context::CoinbaseSubmission),
        Box::new(context::ProgramSignatures),
        Box::new(context::DepositReplay),
        Box::new(context::WithdrawalRules),
        Box::new(context::AssetRegistration),
        Box::new(context::DoubleSpend),
        Box::new(context::TimeLock),
        Box::new(context::Balance),
        Box::new(context::ReferencedOutputValue),
    ]
}
