//! Property suite for the exchange engine
//!
//! Increase cases: PROPTEST_CASES=1000 cargo test -p dexter-exchange --test fuzzing
//!
//! This suite implements:
//! - Snapshot-based "no mutation on error" checking
//! - Global invariants (conservation, liquidity accounting, history)
//! - Action-based state machine fuzzer over two exchanges
//! - Focused property tests for liquidity and slippage

mod common;

use common::*;
use dexter_exchange::*;
use proptest::prelude::*;

// ============================================================================
// SECTION 1: SNAPSHOT TYPE FOR "NO MUTATION ON ERROR" CHECKING
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
struct Snapshot {
    exchanges: Vec<Exchange>,
    native: Vec<u128>,
    tokens: Vec<u128>,
    lqt: Vec<u128>,
}

impl Snapshot {
    fn take(h: &Harness) -> Self {
        let mut native = Vec::new();
        let mut tokens = Vec::new();
        let mut lqt = Vec::new();
        let holders: Vec<Address> = h.users.iter().chain(h.exchanges.iter()).cloned().collect();
        for holder in holders.iter().chain(std::iter::once(&reserve())) {
            native.push(h.ledger.balance(holder));
            for token in &h.tokens {
                tokens.push(h.ledger.token_balance(token, holder));
            }
            for exchange in &h.exchanges {
                lqt.push(h.ledger.lqt_balance(exchange, holder));
            }
        }
        Self {
            exchanges: h
                .exchanges
                .iter()
                .map(|a| h.ledger.exchange(a).cloned().unwrap())
                .collect(),
            native,
            tokens,
            lqt,
        }
    }
}

// ============================================================================
// SECTION 2: ACTIONS
// ============================================================================

#[derive(Clone, Debug)]
enum Action {
    XtzToToken { exchange: usize, who: usize, amount: u128, min: u128 },
    TokenToXtz { exchange: usize, who: usize, tokens: u128, min: u128 },
    TokenToToken { from: usize, who: usize, tokens: u128, min: u128 },
    AddLiquidity { exchange: usize, who: usize, amount: u128, max_tokens: u128 },
    RemoveLiquidity { exchange: usize, who: usize, pct: u128 },
    Deposit { exchange: usize, amount: u128 },
    Refresh { exchange: usize, donation: u128 },
}

fn min_strategy() -> impl Strategy<Value = u128> {
    prop_oneof![Just(0u128), 0u128..2_000_000_000]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..2, 0usize..2, 0u128..1_000_000_000, min_strategy())
            .prop_map(|(exchange, who, amount, min)| Action::XtzToToken { exchange, who, amount, min }),
        (0usize..2, 0usize..2, 0u128..1_000_000_000, min_strategy())
            .prop_map(|(exchange, who, tokens, min)| Action::TokenToXtz { exchange, who, tokens, min }),
        (0usize..2, 0usize..2, 0u128..1_000_000_000, min_strategy())
            .prop_map(|(from, who, tokens, min)| Action::TokenToToken { from, who, tokens, min }),
        (0usize..2, 0usize..2, 0u128..1_000_000_000, prop_oneof![Just(u128::MAX), 0u128..1_000_000_000])
            .prop_map(|(exchange, who, amount, max_tokens)| Action::AddLiquidity { exchange, who, amount, max_tokens }),
        (0usize..2, 0usize..2, 0u128..=100)
            .prop_map(|(exchange, who, pct)| Action::RemoveLiquidity { exchange, who, pct }),
        (0usize..2, 0u128..1_000_000)
            .prop_map(|(exchange, amount)| Action::Deposit { exchange, amount }),
        (0usize..2, 0u128..1_000_000)
            .prop_map(|(exchange, donation)| Action::Refresh { exchange, donation }),
    ]
}

// ============================================================================
// SECTION 3: HARNESS
// ============================================================================

struct Harness {
    ledger: Sandbox,
    exchanges: [Address; 2],
    tokens: [TokenRef; 2],
    users: [Address; 2],
}

impl Harness {
    fn new(xtz_pools: [u128; 2], token_pools: [u128; 2]) -> Self {
        let mut ledger = ledger();
        let (ex_a, token_a) = launch_fa12(&mut ledger, "KT1kusd", xtz_pools[0], token_pools[0]);
        let (ex_b, token_b) = launch_fa2(&mut ledger, "KT1ethtz", 0, xtz_pools[1], token_pools[1]);

        // Bob trades too
        for (token, exchange) in [(&token_a, &ex_a), (&token_b, &ex_b)] {
            ledger.mint_tokens(token, &bob(), 1_000_000_000_000_000).unwrap();
            ledger.authorize(token, &bob(), exchange, u128::MAX).unwrap();
        }

        Self {
            ledger,
            exchanges: [ex_a, ex_b],
            tokens: [token_a, token_b],
            users: [alice(), bob()],
        }
    }

    fn execute(&mut self, action: &Action) {
        let before = Snapshot::take(self);
        let reserve_before = self.ledger.balance(&reserve());

        let result = match action {
            Action::XtzToToken { exchange, who, amount, min } => self.ledger.call(
                &self.exchanges[*exchange],
                &self.users[*who],
                *amount,
                &xtz_to_token(&self.users[*who], *min),
            ),
            Action::TokenToXtz { exchange, who, tokens, min } => self.ledger.call(
                &self.exchanges[*exchange],
                &self.users[*who],
                0,
                &token_to_xtz(&self.users[*who], *tokens, *min),
            ),
            Action::TokenToToken { from, who, tokens, min } => {
                let route = TokenToToken {
                    output_exchange: self.exchanges[1 - *from].clone(),
                    to: self.users[*who].clone(),
                    tokens_sold: *tokens,
                    min_tokens_bought: *min,
                    deadline: DEADLINE,
                };
                self.ledger
                    .token_to_token(&self.exchanges[*from], &self.users[*who], 0, &route)
            }
            Action::AddLiquidity { exchange, who, amount, max_tokens } => {
                let add = ExchangeInstruction::AddLiquidity(AddLiquidity {
                    owner: self.users[*who].clone(),
                    min_lqt_minted: 0,
                    max_tokens_deposited: *max_tokens,
                    deadline: DEADLINE,
                });
                self.ledger
                    .call(&self.exchanges[*exchange], &self.users[*who], *amount, &add)
            }
            Action::RemoveLiquidity { exchange, who, pct } => {
                let ex = self.ledger.exchange(&self.exchanges[*exchange]).unwrap();
                let held = ex.liquidity_balance(&self.users[*who]);
                let remove = ExchangeInstruction::RemoveLiquidity(RemoveLiquidity {
                    to: self.users[*who].clone(),
                    lqt_burned: held * *pct / 100,
                    min_xtz_withdrawn: 0,
                    min_tokens_withdrawn: 0,
                    deadline: DEADLINE,
                });
                self.ledger
                    .call(&self.exchanges[*exchange], &self.users[*who], 0, &remove)
            }
            Action::Deposit { exchange, amount } => self.ledger.call(
                &self.exchanges[*exchange],
                &bob(),
                *amount,
                &ExchangeInstruction::Default,
            ),
            Action::Refresh { exchange, donation } => {
                let address = self.exchanges[*exchange].clone();
                self.ledger
                    .mint_tokens(&self.tokens[*exchange], &address, *donation)
                    .unwrap();
                self.ledger
                    .call(&address, &alice(), 0, &ExchangeInstruction::UpdateTokenPool)
                    .unwrap();
                assert_eq!(self.ledger.settle_callbacks().unwrap(), 1);
                let ex = self.ledger.exchange(&address).unwrap();
                assert_eq!(
                    self.ledger.token_balance(&self.tokens[*exchange], &address),
                    ex.token_pool(),
                    "refresh must sync the token pool"
                );
                Ok(Vec::new())
            }
        };

        if result.is_err() {
            assert_eq!(Snapshot::take(self), before, "{:?} mutated state on error", action);
        }
        assert!(
            self.ledger.balance(&reserve()) >= reserve_before,
            "reserve balance decreased after {:?}",
            action
        );
        self.assert_invariants(action);
    }

    fn assert_invariants(&self, action: &Action) {
        for (address, token) in self.exchanges.iter().zip(self.tokens.iter()) {
            let ex = self.ledger.exchange(address).unwrap();

            // Conservation
            assert_eq!(self.ledger.balance(address), ex.xtz_pool(), "xtz after {:?}", action);
            assert!(
                self.ledger.token_balance(token, address) >= ex.token_pool(),
                "token pool exceeds holdings after {:?}",
                action
            );

            // No empty pools
            assert!(ex.xtz_pool() > 0 && ex.token_pool() > 0 && ex.lqt_total() > 0);

            // Liquidity accounting
            let sum: u128 = ex.liquidity_holders().map(|(_, units)| *units).sum();
            assert_eq!(sum, ex.lqt_total(), "lqt sum after {:?}", action);
            assert_eq!(self.ledger.lqt_supply(address), ex.lqt_total());
            for (holder, units) in ex.liquidity_holders() {
                assert_eq!(self.ledger.lqt_balance(address, holder), *units);
            }

            // History tracks the pools
            assert_eq!(ex.history().xtz_pool, ex.xtz_pool());
            assert_eq!(ex.history().token_pool, ex.token_pool());
            assert!(!ex.is_updating_token_pool());
        }
    }
}

// ============================================================================
// SECTION 4: STATE MACHINE FUZZER
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fuzz_state_machine(
        xtz_a in 1_000_000u128..1_000_000_000_000,
        tok_a in 1_000_000u128..1_000_000_000_000,
        xtz_b in 1_000_000u128..1_000_000_000_000,
        tok_b in 1_000_000u128..1_000_000_000_000,
        actions in prop::collection::vec(action_strategy(), 1..40),
    ) {
        let mut h = Harness::new([xtz_a, xtz_b], [tok_a, tok_b]);
        h.assert_invariants(&Action::Deposit { exchange: 0, amount: 0 });
        for action in &actions {
            h.execute(action);
        }
    }
}

// ============================================================================
// SECTION 5: FOCUSED PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fuzz_prop_slippage_boundary(
        xtz_pool in 1_000u128..1_000_000_000_000,
        token_pool in 1_000u128..1_000_000_000_000,
        xtz_in in 1u128..1_000_000_000,
    ) {
        let mut ledger = ledger();
        let (dex, _) = launch_fa12(&mut ledger, "KT1kusd", xtz_pool, token_pool);
        let computed = dex_model::swap_output(xtz_in, xtz_pool, token_pool).unwrap();

        let err = ledger
            .call(&dex, &alice(), xtz_in, &xtz_to_token(&alice(), computed + 1))
            .unwrap_err();
        prop_assert_eq!(err, DexterError::SlippageExceeded(Slippage::TokensBought));
        prop_assert!(ledger.call(&dex, &alice(), xtz_in, &xtz_to_token(&alice(), computed)).is_ok());
    }

    #[test]
    fn fuzz_prop_add_remove_round_trip_within_rounding(
        xtz_pool in 1_000u128..1_000_000_000_000,
        token_pool in 1_000u128..1_000_000_000_000,
        xtz_in in 1u128..1_000_000_000,
    ) {
        let mut ledger = ledger();
        let (dex, token) = launch_fa12(&mut ledger, "KT1kusd", xtz_pool, token_pool);
        ledger.mint_tokens(&token, &bob(), u64::MAX as u128).unwrap();
        ledger.authorize(&token, &bob(), &dex, u128::MAX).unwrap();

        let xtz_start = ledger.balance(&bob());
        let tokens_start = ledger.token_balance(&token, &bob());

        let add = ExchangeInstruction::AddLiquidity(AddLiquidity {
            owner: bob(),
            min_lqt_minted: 0,
            max_tokens_deposited: u128::MAX,
            deadline: DEADLINE,
        });
        ledger.call(&dex, &bob(), xtz_in, &add).unwrap();
        let minted = ledger.exchange(&dex).unwrap().liquidity_balance(&bob());

        let remove = ExchangeInstruction::RemoveLiquidity(RemoveLiquidity {
            to: bob(),
            lqt_burned: minted,
            min_xtz_withdrawn: 0,
            min_tokens_withdrawn: 0,
            deadline: DEADLINE,
        });
        ledger.call(&dex, &bob(), 0, &remove).unwrap();

        let xtz_end = ledger.balance(&bob());
        let tokens_end = ledger.token_balance(&token, &bob());
        prop_assert!(xtz_end <= xtz_start);
        prop_assert!(tokens_end <= tokens_start);

        // Floor on the mint costs at most one unit's worth of each pool;
        // the ceil on the token deposit costs at most one more token
        let lqt_total = xtz_pool;
        let xtz_bound = (xtz_pool + lqt_total - 1) / lqt_total;
        let token_bound = (token_pool + lqt_total - 1) / lqt_total + 1;
        prop_assert!(xtz_start - xtz_end <= xtz_bound, "xtz shortfall {}", xtz_start - xtz_end);
        prop_assert!(
            tokens_start - tokens_end <= token_bound,
            "token shortfall {}",
            tokens_start - tokens_end
        );
        prop_assert_eq!(ledger.exchange(&dex).unwrap().liquidity_balance(&bob()), 0);
    }

    #[test]
    fn fuzz_prop_reserve_fee_matches_formula(
        pool in 1_000_000u128..1_000_000_000_000,
        tokens_sold in 1u128..1_000_000,
    ) {
        let mut ledger = ledger();
        let (dex, _) = launch_fa12(&mut ledger, "KT1kusd", pool, pool);
        let start = ledger.balance(&reserve());

        ledger
            .call(&dex, &alice(), 0, &token_to_xtz(&alice(), tokens_sold, 0))
            .unwrap();

        let expected = tokens_sold * 3 * pool / (pool * 10_000 + tokens_sold * 3);
        prop_assert_eq!(ledger.balance(&reserve()) - start, expected);
    }
}
