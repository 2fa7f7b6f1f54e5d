use std::sync::Arc;

use tokenchain_ledger::{ChainStore, ErrorKind, LedgerError};
use tokenchain_nullables::fixtures::{
    asset_descriptor, block_after, coinbase, coins, deposit, foreign_transfer, identity,
    register_asset, split_coinbase, tokens, transfer, withdrawal,
};
use tokenchain_nullables::{NullStore, NullVerifier};
use tokenchain_transactions::{
    Block, OutPoint, Output, Transaction, LOCKED_INPUT_SEQUENCE, MAX_OUTPUTS,
};
use tokenchain_types::address::PREFIX_CROSS_CHAIN;
use tokenchain_types::{AssetId, ChainParams, Fixed64, ProgramHash, TxHash, TxType, U256};
use tokenchain_validator::{TransactionValidator, ValidationError};

const FOUNDATION: u8 = 9;

/// A chain at height 2 whose genesis holds a 70/30 coinbase and a 50 coin
/// deposit to identity 1, which is `fund`.
struct Setup {
    chain: ChainStore,
    verifier: Arc<NullVerifier>,
    validator: TransactionValidator,
    native: AssetId,
    blocks: Vec<Block>,
    fund: OutPoint,
}

impl Setup {
    fn new() -> Self {
        Self::with_params(|_| {})
    }

    fn with_params(tweak: impl FnOnce(&mut ChainParams)) -> Self {
        let mut params = ChainParams {
            foundation: identity(FOUNDATION),
            spend_coinbase_span: 2,
            ..ChainParams::default()
        };
        tweak(&mut params);
        let native = params.native_asset_id;
        let chain = ChainStore::open(Arc::new(NullStore::new()), params).unwrap();

        let funding = foreign_transfer(native, &identity(1), coins(50));
        let genesis = block_after(
            None,
            vec![
                split_coinbase(0, native, coins(100), identity(FOUNDATION), identity(1)),
                deposit(&funding, vec![Output::native(native, coins(50), identity(1))]),
            ],
        );
        chain.apply_block(&genesis).unwrap();
        let fund = OutPoint::new(genesis.transactions[1].hash(), 0);

        let verifier = Arc::new(NullVerifier::new());
        let validator = TransactionValidator::new(verifier.clone());
        let mut setup = Self {
            chain,
            verifier,
            validator,
            native,
            blocks: vec![genesis],
            fund,
        };
        setup.advance(2);
        setup
    }

    fn tip(&self) -> &Block {
        self.blocks.last().unwrap()
    }

    /// Apply `n` blocks holding only a one-coin coinbase to identity 8.
    fn advance(&mut self, n: u32) {
        for _ in 0..n {
            self.apply(Vec::new());
        }
    }

    /// Apply a block without validating it.
    fn apply(&mut self, txs: Vec<Transaction>) -> Block {
        let height = self.tip().height() + 1;
        let mut all = vec![coinbase(
            height,
            vec![Output::native(self.native, coins(1), identity(8))],
        )];
        all.extend(txs);
        let block = block_after(Some(self.tip()), all);
        self.chain.apply_block(&block).unwrap();
        self.blocks.push(block.clone());
        block
    }

    fn pay(&self, value: Fixed64, to: u8) -> Output {
        Output::native(self.native, value, identity(to))
    }

    fn sanity(&self, tx: &Transaction) -> Result<(), ValidationError> {
        self.validator.validate_sanity(tx, &self.chain.view())
    }

    fn context(&self, tx: &Transaction) -> Result<(), ValidationError> {
        self.validator.validate_context(tx, &self.chain.view())
    }

    fn validate(&self, tx: &Transaction) -> Result<(), ValidationError> {
        self.validator.validate(tx, &self.chain.view())
    }

    fn validate_block(&self, block: &Block) -> Result<(), ValidationError> {
        self.validator.validate_block(block, &self.chain.view())
    }

    fn gold_registration(&self) -> Transaction {
        register_asset(
            asset_descriptor("GOLD", 8),
            coins(1000),
            identity(5),
            tokens(1000),
            &[self.fund],
            vec![self.pay(coins(39), 1)],
        )
    }
}

// Sanity

#[test]
fn coinbase_foundation_share_boundary() {
    let s = Setup::new();
    let exact = coinbase(
        7,
        vec![s.pay(coins(30), FOUNDATION), s.pay(coins(70), 1)],
    );
    assert!(s.sanity(&exact).is_ok());

    let short = coinbase(
        7,
        vec![
            s.pay(Fixed64::new(2_999_999_999), FOUNDATION),
            s.pay(Fixed64::new(7_000_000_001), 1),
        ],
    );
    let err = s.sanity(&short).unwrap_err();
    assert!(matches!(err, ValidationError::FoundationReward { .. }));
    assert_eq!(err.kind(), ErrorKind::Economic);

    let single = coinbase(7, vec![s.pay(coins(100), FOUNDATION)]);
    assert!(matches!(
        s.sanity(&single),
        Err(ValidationError::CoinbaseOutputs(1))
    ));
}

#[test]
fn coinbase_outputs_are_native_and_non_negative() {
    let mut s = Setup::new();
    let clawback = coinbase(
        7,
        vec![
            s.pay(coins(300), FOUNDATION),
            s.pay(coins(700), 7),
            s.pay(coins(-990), 3),
        ],
    );
    assert!(matches!(
        s.sanity(&clawback),
        Err(ValidationError::InvalidOutputValue { index: 2, .. })
    ));

    let registration = s.gold_registration();
    s.apply(vec![registration]);
    let gold = asset_descriptor("GOLD", 8).id();
    let printing = coinbase(
        7,
        vec![
            s.pay(coins(3), FOUNDATION),
            s.pay(coins(7), 7),
            Output::token(gold, tokens(1_000_000), identity(7)),
        ],
    );
    let err = s.sanity(&printing).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::CoinbaseTokenOutput { index: 2, asset } if asset == gold
    ));
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn output_count_is_bounded_by_the_outpoint_index() {
    let s = Setup::new();
    let dust = s.pay(Fixed64::new(1), 2);
    let wide = transfer(&[s.fund], vec![dust; MAX_OUTPUTS + 1]);
    assert!(matches!(
        s.sanity(&wide),
        Err(ValidationError::TooManyOutputs { count, limit })
            if count == MAX_OUTPUTS + 1 && limit == MAX_OUTPUTS
    ));
}

#[test]
fn transaction_shape_rules() {
    let s = Setup::new();
    let out = || vec![s.pay(coins(1), 2)];

    assert!(matches!(
        s.sanity(&transfer(&[], out())),
        Err(ValidationError::NoInputs)
    ));
    assert!(matches!(
        s.sanity(&transfer(&[s.fund, s.fund], out())),
        Err(ValidationError::DoubleSpend { outpoint }) if outpoint == s.fund
    ));
    assert!(matches!(
        s.sanity(&transfer(&[s.fund], Vec::new())),
        Err(ValidationError::NoOutputs)
    ));

    let mut mislabelled = transfer(&[s.fund], out());
    mislabelled.tx_type = TxType::Record;
    let err = s.sanity(&mislabelled).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::PayloadMismatch {
            tx_type: TxType::Record,
            payload: TxType::Transfer
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Structural);

    let foreign = foreign_transfer(s.native, &identity(2), coins(1));
    let mut with_inputs = deposit(&foreign, out());
    with_inputs.inputs = transfer(&[s.fund], Vec::new()).inputs;
    assert!(matches!(
        s.sanity(&with_inputs),
        Err(ValidationError::UnexpectedInputs(TxType::Deposit))
    ));
}

#[test]
fn output_value_and_recipient_rules() {
    let s = Setup::new();

    let mut token_in_native = s.pay(coins(1), 2);
    token_in_native.token_value = U256::one();
    assert!(matches!(
        s.sanity(&transfer(&[s.fund], vec![token_in_native])),
        Err(ValidationError::InvalidOutputValue { index: 0, .. })
    ));

    let nowhere = Output::native(s.native, coins(1), ProgramHash::new([0x55; 21]));
    assert!(matches!(
        s.sanity(&transfer(&[s.fund], vec![s.pay(coins(1), 2), nowhere])),
        Err(ValidationError::InvalidRecipient { index: 1 })
    ));

    let burn = Output::native(s.native, coins(1), ProgramHash::BURN);
    assert!(s.sanity(&transfer(&[s.fund], vec![burn])).is_ok());

    let unknown = AssetId::new([7; 32]);
    assert!(matches!(
        s.sanity(&transfer(&[s.fund], vec![Output::token(unknown, tokens(1), identity(2))])),
        Err(ValidationError::UnknownAsset { index: 0, asset }) if asset == unknown
    ));

    let foreign = foreign_transfer(s.native, &identity(2), coins(1));
    let token_deposit = deposit(&foreign, vec![Output::token(unknown, tokens(1), identity(2))]);
    assert!(matches!(
        s.sanity(&token_deposit),
        Err(ValidationError::CrossChainTokenOutput { index: 0 })
    ));
}

#[test]
fn registration_precision_must_be_in_range() {
    let s = Setup::new();
    let wide = register_asset(
        asset_descriptor("WIDE", 19),
        coins(1),
        identity(5),
        tokens(1),
        &[s.fund],
        Vec::new(),
    );
    assert!(matches!(
        s.sanity(&wide),
        Err(ValidationError::InvalidAssetPrecision(19))
    ));
}

#[test]
fn token_output_finer_than_asset_precision_is_rejected() {
    let mut s = Setup::new();
    let registration = s.gold_registration();
    s.apply(vec![registration.clone()]);
    let gold = asset_descriptor("GOLD", 8).id();

    // 0.000000001 GOLD at eighteen decimals.
    let dust = transfer(&[s.fund], vec![Output::token(gold, U256::exp10(9), identity(2))]);
    assert!(matches!(
        s.sanity(&dust),
        Err(ValidationError::InvalidPrecision { index: 0, precision: 8 })
    ));

    let smallest = transfer(&[s.fund], vec![Output::token(gold, U256::exp10(10), identity(2))]);
    assert!(s.sanity(&smallest).is_ok());
}

// Context

#[test]
fn valid_transfer_passes_every_check() {
    let s = Setup::new();
    let tx = transfer(&[s.fund], vec![s.pay(coins(20), 2), s.pay(coins(20), 3)]);
    s.validate(&tx).unwrap();
}

#[test]
fn fee_below_minimum_is_rejected() {
    let s = Setup::new();
    let tx = transfer(&[s.fund], vec![s.pay(Fixed64::new(coins(50).raw() - 99), 2)]);
    let err = s.validate(&tx).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::InsufficientFee { required, .. } if required == Fixed64::new(100)
    ));
    assert_eq!(err.kind(), ErrorKind::Economic);
}

#[test]
fn known_hash_and_coinbase_are_refused() {
    let s = Setup::new();
    let known = s.blocks[0].transactions[1].clone();
    assert!(matches!(
        s.context(&known),
        Err(ValidationError::DuplicateTransaction(_))
    ));

    let fresh_coinbase = coinbase(99, vec![s.pay(coins(3), FOUNDATION), s.pay(coins(7), 1)]);
    assert!(matches!(
        s.context(&fresh_coinbase),
        Err(ValidationError::CoinbaseNotSubmittable)
    ));
}

#[test]
fn rejected_program_fails_authorization() {
    let s = Setup::new();
    let tx = transfer(&[s.fund], vec![s.pay(coins(49), 2)]);
    s.verifier.reject(tx.hash());
    let err = s.context(&tx).unwrap_err();
    assert!(matches!(err, ValidationError::SignatureRejected));
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn spent_and_unknown_references() {
    let mut s = Setup::new();
    s.apply(vec![transfer(&[s.fund], vec![s.pay(coins(49), 2)])]);

    let again = transfer(&[s.fund], vec![s.pay(coins(48), 3)]);
    assert!(matches!(
        s.context(&again),
        Err(ValidationError::DoubleSpend { outpoint }) if outpoint == s.fund
    ));

    let phantom = transfer(
        &[OutPoint::new(TxHash::new([3; 32]), 0)],
        vec![s.pay(coins(1), 3)],
    );
    let err = s.context(&phantom).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::Ledger(LedgerError::UnknownReference { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Reference);
}

#[test]
fn coinbase_maturity_boundary() {
    let mut s = Setup::new();
    // Tip is at height 2; the coinbase of block 1 has one confirmation.
    let young = OutPoint::new(s.blocks[1].transactions[0].hash(), 0);
    let spend = transfer(&[young], vec![s.pay(Fixed64::new(coins(1).raw() - 1_000), 2)]);
    assert!(matches!(
        s.context(&spend),
        Err(ValidationError::IneffectiveCoinbase {
            confirmations: 1,
            required: 2,
            ..
        })
    ));

    s.advance(1);
    s.context(&spend).unwrap();
}

#[test]
fn locked_output_needs_sequence_and_lock_time() {
    let mut s = Setup::new();
    let lock_tx = transfer(&[s.fund], vec![s.pay(coins(49), 2).with_lock(10)]);
    s.apply(vec![lock_tx.clone()]);
    let locked = OutPoint::new(lock_tx.hash(), 0);

    let mut spend = transfer(&[locked], vec![s.pay(coins(48), 3)]);
    assert!(matches!(
        s.context(&spend),
        Err(ValidationError::InvalidInputSequence { .. })
    ));

    spend.inputs[0].sequence = LOCKED_INPUT_SEQUENCE;
    assert!(matches!(
        s.context(&spend),
        Err(ValidationError::OutputLocked { lock: 10, .. })
    ));

    // Lock time reached, but not yet final at the next height (tip is 3).
    let spend = spend.with_lock_time(10);
    assert!(matches!(
        s.context(&spend),
        Err(ValidationError::OutputLocked { .. })
    ));

    s.advance(6);
    s.context(&spend).unwrap();
}

#[test]
fn registration_rules() {
    let s = Setup::new();
    s.validate(&s.gold_registration()).unwrap();

    let reserved = register_asset(
        asset_descriptor("ELA", 8),
        coins(1),
        identity(5),
        tokens(1),
        &[s.fund],
        vec![s.pay(coins(39), 1)],
    );
    assert!(matches!(
        s.context(&reserved),
        Err(ValidationError::AssetNameTaken(name)) if name == "ELA"
    ));

    let accented = register_asset(
        asset_descriptor("GÖLD", 8),
        coins(1),
        identity(5),
        tokens(1),
        &[s.fund],
        vec![s.pay(coins(39), 1)],
    );
    assert!(matches!(
        s.context(&accented),
        Err(ValidationError::NonAsciiAsset)
    ));

    let short_mint = register_asset(
        asset_descriptor("SILVER", 8),
        coins(1000),
        identity(5),
        tokens(999),
        &[s.fund],
        vec![s.pay(coins(39), 1)],
    );
    assert!(matches!(
        s.context(&short_mint),
        Err(ValidationError::RegistrationAmount { .. })
    ));

    let mut misdirected = s.gold_registration();
    misdirected.outputs[1].program_hash = identity(6);
    assert!(matches!(
        s.context(&misdirected),
        Err(ValidationError::RegistrationController { index: 1 })
    ));
}

#[test]
fn registration_mints_only_its_own_asset() {
    let mut s = Setup::new();
    let gold_registration = s.gold_registration();
    s.apply(vec![gold_registration.clone()]);
    let gold = asset_descriptor("GOLD", 8).id();
    let change = OutPoint::new(gold_registration.hash(), 0);

    let silver = |extra: Vec<Output>| {
        let mut outputs = vec![s.pay(coins(29), 1)];
        outputs.extend(extra);
        register_asset(
            asset_descriptor("SILVER", 8),
            coins(1000),
            identity(5),
            tokens(1000),
            &[change],
            outputs,
        )
    };
    s.validate(&silver(Vec::new())).unwrap();

    let counterfeit = silver(vec![Output::token(gold, tokens(1_000_000), identity(7))]);
    let err = s.validate(&counterfeit).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::TokenImbalance { asset, .. } if asset == gold
    ));
    assert_eq!(err.kind(), ErrorKind::Economic);
}

#[test]
fn token_transfers_must_balance() {
    let mut s = Setup::new();
    let registration = s.gold_registration();
    s.apply(vec![registration.clone()]);
    let gold = asset_descriptor("GOLD", 8).id();
    let change = OutPoint::new(registration.hash(), 0);
    let minted = OutPoint::new(registration.hash(), 1);

    let leaky = transfer(
        &[minted, change],
        vec![
            Output::token(gold, tokens(999), identity(6)),
            s.pay(coins(38), 1),
        ],
    );
    assert!(matches!(
        s.validate(&leaky),
        Err(ValidationError::TokenImbalance { asset, .. }) if asset == gold
    ));

    let balanced = transfer(
        &[minted, change],
        vec![
            Output::token(gold, tokens(1000), identity(6)),
            s.pay(coins(38), 1),
        ],
    );
    s.validate(&balanced).unwrap();
}

#[test]
fn deposit_replay_is_refused() {
    let s = Setup::new();
    let already = foreign_transfer(s.native, &identity(1), coins(50));
    let replay = deposit(
        &already,
        vec![s.pay(Fixed64::new(coins(50).raw() - 10_000), 1)],
    );
    let err = s.validate(&replay).unwrap_err();
    assert!(matches!(err, ValidationError::DepositReplay(_)));
    assert_eq!(err.kind(), ErrorKind::Replay);

    let fresh = foreign_transfer(s.native, &identity(2), coins(3));
    let claim = deposit(&fresh, vec![s.pay(Fixed64::new(coins(3).raw() - 10_000), 2)]);
    s.validate(&claim).unwrap();
}

#[test]
fn withdrawal_amount_must_leave_the_cross_chain_fee() {
    let s = Setup::new();
    let exit = ProgramHash::with_prefix(PREFIX_CROSS_CHAIN, [4; 20]);
    let target = identity(7).to_address();
    let outputs = || {
        vec![
            Output::native(s.native, coins(10), exit),
            s.pay(coins(39), 1),
        ]
    };

    let ok = withdrawal(
        &[s.fund],
        outputs(),
        vec![(target.clone(), 0, Fixed64::new(coins(10).raw() - 10_000))],
    );
    s.validate(&ok).unwrap();

    let greedy = withdrawal(&[s.fund], outputs(), vec![(target, 0, coins(10))]);
    let err = s.validate(&greedy).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidWithdrawal(_)));
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

// Blocks

fn fee_paying_block(s: &Setup, reward: Fixed64, txs: Vec<Transaction>) -> Block {
    let height = s.tip().height() + 1;
    let mut all = vec![split_coinbase(
        height,
        s.native,
        reward,
        identity(FOUNDATION),
        identity(1),
    )];
    all.extend(txs);
    block_after(Some(s.tip()), all)
}

#[test]
fn block_reward_must_equal_fees() {
    let s = Setup::new();
    let tx = transfer(&[s.fund], vec![s.pay(coins(40), 2)]);

    s.validate_block(&fee_paying_block(&s, coins(10), vec![tx.clone()]))
        .unwrap();

    assert!(matches!(
        s.validate_block(&fee_paying_block(&s, coins(11), vec![tx])),
        Err(ValidationError::RewardMismatch { .. })
    ));
}

#[test]
fn negative_coinbase_output_cannot_inflate_the_reward() {
    let s = Setup::new();
    let tx = transfer(&[s.fund], vec![s.pay(coins(40), 2)]);
    let height = s.tip().height() + 1;
    let clawback = coinbase(
        height,
        vec![
            s.pay(coins(300), FOUNDATION),
            s.pay(coins(700), 7),
            s.pay(coins(-990), 3),
        ],
    );
    let block = block_after(Some(s.tip()), vec![clawback, tx]);
    assert!(matches!(
        s.validate_block(&block),
        Err(ValidationError::InvalidOutputValue { index: 2, .. })
    ));
}

#[test]
fn block_structure_rules() {
    let s = Setup::new();
    let tx = transfer(&[s.fund], vec![s.pay(coins(40), 2)]);

    let headless = block_after(Some(s.tip()), vec![tx.clone()]);
    assert!(matches!(
        s.validate_block(&headless),
        Err(ValidationError::MissingCoinbase)
    ));

    let mut doubled = fee_paying_block(&s, coins(10), vec![tx.clone()]);
    doubled.transactions.push(coinbase(
        42,
        vec![s.pay(coins(3), FOUNDATION), s.pay(coins(7), 1)],
    ));
    assert!(matches!(
        s.validate_block(&doubled),
        Err(ValidationError::CoinbaseMisplaced(2))
    ));

    let mut tampered = fee_paying_block(&s, coins(10), vec![tx]);
    tampered.header.merkle_root = TxHash::ZERO;
    assert!(matches!(
        s.validate_block(&tampered),
        Err(ValidationError::MerkleMismatch)
    ));
}

#[test]
fn conflicting_spends_in_one_block() {
    let s = Setup::new();
    let first = transfer(&[s.fund], vec![s.pay(coins(40), 2)]);
    let second = transfer(&[s.fund], vec![s.pay(coins(30), 3)]);
    let block = fee_paying_block(&s, coins(30), vec![first, second]);
    assert!(matches!(
        s.validate_block(&block),
        Err(ValidationError::DoubleSpend { outpoint }) if outpoint == s.fund
    ));
}

#[test]
fn block_size_limit() {
    let s = Setup::with_params(|p| p.max_tx_per_block = 1);
    let tx = transfer(&[s.fund], vec![s.pay(coins(40), 2)]);
    let block = fee_paying_block(&s, coins(10), vec![tx]);
    assert!(matches!(
        s.validate_block(&block),
        Err(ValidationError::TooManyTransactions { count: 2, limit: 1 })
    ));
}
