//! Exchange storage
//!
//! Fields are crate-private: the instruction handlers are the only writers,
//! and each of them validates fully before touching anything.

use super::history::{Direction, HistoryRecord, HistoryTracker, UserInvestment};
use crate::error::{DexterError, Result};
use crate::types::{Address, Context, TokenRef};
use serde::Serialize;
use std::collections::BTreeMap;

/// Launch parameters (see `ExchangeFactory::launch_exchange`)
#[derive(Debug, Clone)]
pub struct ExchangeInit {
    pub address: Address,
    pub token: TokenRef,
    pub lqt_address: Address,
    pub manager: Address,
    pub reserve: Address,
    /// Credited with the initial liquidity
    pub launcher: Address,
    pub xtz_pool: u128,
    pub token_pool: u128,
}

/// One trading pair: native asset against a single token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub(crate) address: Address,

    // Pools
    pub(crate) xtz_pool: u128,
    pub(crate) token_pool: u128,
    pub(crate) lqt_total: u128,
    pub(crate) liquidity_balances: BTreeMap<Address, u128>,

    // Fixed at launch
    pub(crate) token: TokenRef,
    pub(crate) lqt_address: Address,
    pub(crate) manager: Address,

    /// Fee beneficiary; only the current reserve may replace itself
    pub(crate) reserve: Address,

    // Delegation
    pub(crate) baker: Option<Address>,
    pub(crate) frozen: bool,

    /// Set between update_token_pool and its callback
    pub(crate) updating_token_pool: bool,

    pub(crate) history: HistoryTracker,
}

impl Exchange {
    /// Create an exchange seeded with its first liquidity
    ///
    /// The launcher receives `lqt_total = xtz_pool` liquidity units.
    pub fn initialize(init: ExchangeInit) -> Result<Self> {
        if init.xtz_pool == 0 || init.token_pool == 0 {
            return Err(DexterError::InsufficientLiquidity);
        }

        let mut history = HistoryTracker::new(init.xtz_pool, init.token_pool);
        history.record_investment(&init.launcher, Direction::Add, init.xtz_pool, init.token_pool);

        let mut liquidity_balances = BTreeMap::new();
        liquidity_balances.insert(init.launcher, init.xtz_pool);

        Ok(Self {
            address: init.address,
            xtz_pool: init.xtz_pool,
            token_pool: init.token_pool,
            lqt_total: init.xtz_pool,
            liquidity_balances,
            token: init.token,
            lqt_address: init.lqt_address,
            manager: init.manager,
            reserve: init.reserve,
            baker: None,
            frozen: false,
            updating_token_pool: false,
            history,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn xtz_pool(&self) -> u128 {
        self.xtz_pool
    }

    pub fn token_pool(&self) -> u128 {
        self.token_pool
    }

    pub fn lqt_total(&self) -> u128 {
        self.lqt_total
    }

    pub fn liquidity_balance(&self, account: &Address) -> u128 {
        self.liquidity_balances.get(account).copied().unwrap_or(0)
    }

    pub fn liquidity_holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.liquidity_balances.iter()
    }

    pub fn token(&self) -> &TokenRef {
        &self.token
    }

    pub fn lqt_address(&self) -> &Address {
        &self.lqt_address
    }

    pub fn manager(&self) -> &Address {
        &self.manager
    }

    pub fn reserve(&self) -> &Address {
        &self.reserve
    }

    pub fn baker(&self) -> Option<&Address> {
        self.baker.as_ref()
    }

    pub fn is_baker_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_updating_token_pool(&self) -> bool {
        self.updating_token_pool
    }

    pub fn history(&self) -> HistoryRecord {
        self.history.record()
    }

    pub fn history_tracker(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn user_investment(&self, account: &Address) -> Option<UserInvestment> {
        self.history.user_investment(account)
    }

    // ========================================================================
    // Guards shared by the entry points
    // ========================================================================

    pub(crate) fn ensure_not_updating(&self) -> Result<()> {
        if self.updating_token_pool {
            return Err(DexterError::Busy);
        }
        Ok(())
    }

    /// Payouts must leave the contract, or the pools drift from the balances
    pub(crate) fn ensure_external(&self, recipient: &Address) -> Result<()> {
        if recipient == &self.address {
            log::warn!("{}: refusing to pay out to itself", self.address);
            return Err(DexterError::SelfRecipient);
        }
        Ok(())
    }

    // ========================================================================
    // Mutators (infallible; callers validate first)
    // ========================================================================

    pub(crate) fn set_pools(&mut self, xtz_pool: u128, token_pool: u128) {
        self.xtz_pool = xtz_pool;
        self.token_pool = token_pool;
    }

    pub(crate) fn set_liquidity(&mut self, account: &Address, balance: u128, lqt_total: u128) {
        if balance == 0 {
            self.liquidity_balances.remove(account);
        } else {
            self.liquidity_balances.insert(account.clone(), balance);
        }
        self.lqt_total = lqt_total;
    }
}

/// Fails with `Expired` once `now` is past `deadline`
pub(crate) fn ensure_deadline(ctx: &Context, deadline: i64) -> Result<()> {
    if ctx.now > deadline {
        return Err(DexterError::Expired);
    }
    Ok(())
}

/// Entry points that do not consume native asset must not receive any
pub(crate) fn ensure_no_amount(ctx: &Context) -> Result<()> {
    if ctx.amount > 0 {
        return Err(DexterError::NonZeroAmount);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_initialize_credits_launcher() {
        let ex = exchange();
        assert_eq!(ex.lqt_total(), POOL);
        assert_eq!(ex.liquidity_balance(&addr("launcher")), POOL);
        assert_eq!(
            ex.history(),
            HistoryRecord {
                xtz_pool: POOL,
                token_pool: POOL,
                xtz_volume: 0
            }
        );
        assert_eq!(
            ex.user_investment(&addr("launcher")),
            Some(UserInvestment {
                direction: Direction::Add,
                xtz: POOL,
                token: POOL
            })
        );
        assert!(!ex.is_baker_frozen());
        assert!(!ex.is_updating_token_pool());
    }

    #[test]
    fn test_initialize_rejects_empty_pools() {
        let err = Exchange::initialize(ExchangeInit {
            address: addr("dex"),
            token: TokenRef::single("token"),
            lqt_address: addr("lqt"),
            manager: addr("factory"),
            reserve: addr("reserve"),
            launcher: addr("launcher"),
            xtz_pool: 0,
            token_pool: 5,
        })
        .unwrap_err();
        assert_eq!(err, DexterError::InsufficientLiquidity);
    }

    #[test]
    fn test_deadline_inclusive() {
        let c = ctx("alice", 0);
        assert!(ensure_deadline(&c, NOW).is_ok());
        assert_eq!(ensure_deadline(&c, NOW - 1), Err(DexterError::Expired));
    }
}
