//! The two capability sets a validator is composed from.
//!
//! A [`SanityCheck`] looks at one transaction in isolation, consulting the
//! ledger only for asset metadata. A [`ContextCheck`] judges the transaction
//! against the committed ledger state. Both receive the same
//! [`CheckContext`], built fresh for every validation.

use tokenchain_ledger::LedgerView;
use tokenchain_transactions::{ProgramVerifier, Transaction};
use tokenchain_types::ChainParams;

use crate::ValidationError;

pub struct CheckContext<'v, 'a> {
    pub view: &'v LedgerView<'a>,
    pub verifier: &'v dyn ProgramVerifier,
}

impl CheckContext<'_, '_> {
    pub fn params(&self) -> &ChainParams {
        self.view.params()
    }
}

pub trait SanityCheck: Send + Sync {
    /// Stable name, used in rejection logs.
    fn name(&self) -> &'static str;

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError>;
}

pub trait ContextCheck: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, tx: &Transaction, cx: &CheckContext<'_, '_>) -> Result<(), ValidationError>;
}
