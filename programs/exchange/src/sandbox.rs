//! In-memory ledger
//!
//! Holds native balances, token contracts, exchanges and one factory, and
//! executes engine calls the way the chain would: the call and every
//! operation it emits commit together, or nothing does.
//!
//! Balance requests are queued rather than answered inline. They are
//! delivered by [`Sandbox::settle_callbacks`], which makes the window in
//! which an exchange is busy observable.

use crate::entrypoint::{process_instruction, process_token_to_token};
use crate::error::{DexterError, Result};
use crate::factory::ExchangeFactory;
use crate::instructions::{ExchangeInstruction, TokenToToken};
use crate::operation::Operation;
use crate::state::Exchange;
use crate::token::{Fa12Token, Fa2Token, TokenContract};
use crate::types::{Address, Context, TokenRef};
use std::collections::{BTreeMap, VecDeque};

/// Balance request waiting for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCallback {
    pub token: TokenRef,
    pub owner: Address,
    pub callback: Address,
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    now: i64,
    native: BTreeMap<Address, u128>,
    tokens: BTreeMap<Address, Box<dyn TokenContract>>,
    /// Liquidity tokens, keyed by lqt address
    lqt_tokens: BTreeMap<Address, Fa12Token>,
    exchanges: BTreeMap<Address, Exchange>,
    factory: ExchangeFactory,
    pending: VecDeque<PendingCallback>,
}

impl Sandbox {
    pub fn new(factory: Address, default_reserve: Address, now: i64) -> Self {
        Self {
            now,
            native: BTreeMap::new(),
            tokens: BTreeMap::new(),
            lqt_tokens: BTreeMap::new(),
            exchanges: BTreeMap::new(),
            factory: ExchangeFactory::new(factory, default_reserve),
            pending: VecDeque::new(),
        }
    }

    // ========================================================================
    // Clock and accounts
    // ========================================================================

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn set_time(&mut self, now: i64) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: i64) {
        self.now = self.now.saturating_add(seconds);
    }

    /// Credit native asset out of thin air
    pub fn fund(&mut self, account: &Address, amount: u128) -> Result<()> {
        let balance = self.native.entry(account.clone()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(DexterError::Overflow)?;
        Ok(())
    }

    pub fn balance(&self, account: &Address) -> u128 {
        self.native.get(account).copied().unwrap_or(0)
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    pub fn originate_token(&mut self, address: Address, contract: Box<dyn TokenContract>) {
        log::debug!("Originated {} token at {}", contract.standard(), address);
        self.tokens.insert(address, contract);
    }

    pub fn originate_fa12(&mut self, address: Address) {
        self.originate_token(address, Box::new(Fa12Token::new()));
    }

    pub fn originate_fa2(&mut self, address: Address) {
        self.originate_token(address, Box::new(Fa2Token::new()));
    }

    pub fn token(&self, address: &Address) -> Result<&dyn TokenContract> {
        self.tokens
            .get(address)
            .map(|contract| contract.as_ref())
            .ok_or_else(|| DexterError::UnknownContract(address.clone()))
    }

    pub fn mint_tokens(&mut self, token: &TokenRef, owner: &Address, amount: u128) -> Result<()> {
        self.token_mut(&token.address)?
            .mint(owner, token.token_id, amount)?;
        Ok(())
    }

    /// Approve (FA1.2) or add an operator (FA2) on `owner`'s behalf
    pub fn authorize(
        &mut self,
        token: &TokenRef,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<()> {
        self.token_mut(&token.address)?
            .authorize(owner, spender, token.token_id, amount)?;
        Ok(())
    }

    pub fn token_balance(&self, token: &TokenRef, owner: &Address) -> u128 {
        self.tokens
            .get(&token.address)
            .map(|contract| contract.balance_of(owner, token.token_id))
            .unwrap_or(0)
    }

    /// Liquidity token balance of `owner` at `exchange`
    pub fn lqt_balance(&self, exchange: &Address, owner: &Address) -> u128 {
        self.exchanges
            .get(exchange)
            .and_then(|ex| self.lqt_tokens.get(ex.lqt_address()))
            .map(|lqt| lqt.balance_of(owner, 0))
            .unwrap_or(0)
    }

    pub fn lqt_supply(&self, exchange: &Address) -> u128 {
        self.exchanges
            .get(exchange)
            .and_then(|ex| self.lqt_tokens.get(ex.lqt_address()))
            .map(|lqt| lqt.total_supply())
            .unwrap_or(0)
    }

    // ========================================================================
    // Exchanges
    // ========================================================================

    pub fn factory(&self) -> &ExchangeFactory {
        &self.factory
    }

    pub fn exchange(&self, address: &Address) -> Option<&Exchange> {
        self.exchanges.get(address)
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.values()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.pending.len()
    }

    /// Launch an exchange through the factory
    ///
    /// The launcher must have authorized the factory to pull `token_amount`.
    pub fn launch_exchange(
        &mut self,
        launcher: &Address,
        token: TokenRef,
        token_amount: u128,
        xtz: u128,
    ) -> Result<Address> {
        self.transact(|ledger| {
            let factory = ledger.factory.address().clone();
            ledger.move_native(launcher, &factory, xtz)?;

            let ctx = Context::new(launcher.clone(), xtz, ledger.now);
            let launch = ledger.factory.launch_exchange(&ctx, token, token_amount)?;
            let address = launch.exchange.address().clone();

            ledger.lqt_tokens.insert(
                launch.exchange.lqt_address().clone(),
                Fa12Token::with_admin(address.clone()),
            );
            ledger.exchanges.insert(address.clone(), launch.exchange);
            ledger.execute(&launch.operations)?;
            Ok(address)
        })
    }

    /// Call a single-exchange entry point with `amount` attached
    pub fn call(
        &mut self,
        exchange: &Address,
        sender: &Address,
        amount: u128,
        instruction: &ExchangeInstruction,
    ) -> Result<Vec<Operation>> {
        self.transact(|ledger| {
            ledger.move_native(sender, exchange, amount)?;

            let ctx = Context::new(sender.clone(), amount, ledger.now);
            let target = ledger.exchange_mut(exchange)?;
            let ops = process_instruction(target, &ctx, instruction)?;
            ledger.execute(&ops)?;
            Ok(ops)
        })
    }

    /// Route `input`'s token into `params.output_exchange`'s token
    pub fn token_to_token(
        &mut self,
        input: &Address,
        sender: &Address,
        amount: u128,
        params: &TokenToToken,
    ) -> Result<Vec<Operation>> {
        self.transact(|ledger| {
            ledger.move_native(sender, input, amount)?;
            if input == &params.output_exchange {
                return Err(DexterError::InvalidIntermediate);
            }

            // Both exchanges leave the map so they can be borrowed together;
            // on error the staged ledger is discarded anyway
            let mut source = ledger
                .exchanges
                .remove(input)
                .ok_or_else(|| DexterError::UnknownContract(input.clone()))?;
            let mut output = ledger
                .exchanges
                .remove(&params.output_exchange)
                .ok_or(DexterError::InvalidIntermediate)?;

            let ctx = Context::new(sender.clone(), amount, ledger.now);
            log::info!("Instruction: TokenToToken on {}", input);
            let result = process_token_to_token(&mut source, &mut output, &ctx, params);

            ledger.exchanges.insert(input.clone(), source);
            ledger.exchanges.insert(params.output_exchange.clone(), output);

            let ops = result?;
            ledger.execute(&ops)?;
            Ok(ops)
        })
    }

    /// Deliver queued balance requests, oldest first
    ///
    /// Each delivery is its own transaction. Stops at the first failure,
    /// leaving that request queued.
    pub fn settle_callbacks(&mut self) -> Result<usize> {
        let mut settled = 0;
        while let Some(request) = self.pending.front().cloned() {
            self.transact(|ledger| {
                ledger.pending.pop_front();
                let balance = ledger
                    .token(&request.token.address)?
                    .balance_of(&request.owner, request.token.token_id);

                let ctx = Context::new(request.token.address.clone(), 0, ledger.now);
                let exchange = ledger.exchange_mut(&request.callback)?;
                let ops = process_instruction(
                    exchange,
                    &ctx,
                    &ExchangeInstruction::UpdateTokenPoolInternal(balance),
                )?;
                ledger.execute(&ops)
            })?;
            settled += 1;
        }
        Ok(settled)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run `f` on a staged copy; commit only if it succeeds
    fn transact<T>(&mut self, f: impl FnOnce(&mut Sandbox) -> Result<T>) -> Result<T> {
        let mut staged = self.clone();
        let value = f(&mut staged)?;
        *self = staged;
        Ok(value)
    }

    fn exchange_mut(&mut self, address: &Address) -> Result<&mut Exchange> {
        self.exchanges
            .get_mut(address)
            .ok_or_else(|| DexterError::UnknownContract(address.clone()))
    }

    fn token_mut(&mut self, address: &Address) -> Result<&mut Box<dyn TokenContract>> {
        self.tokens
            .get_mut(address)
            .ok_or_else(|| DexterError::UnknownContract(address.clone()))
    }

    fn move_native(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.balance(from);
        if balance < amount {
            return Err(DexterError::NativeBalance {
                account: from.clone(),
                balance,
                required: amount,
            });
        }
        self.native.insert(from.clone(), balance - amount);
        self.fund(to, amount)
    }

    fn execute(&mut self, ops: &[Operation]) -> Result<()> {
        for op in ops {
            match op {
                Operation::Send { from, to, amount } => self.move_native(from, to, *amount)?,
                Operation::TokenTransfer {
                    token,
                    operator,
                    from,
                    to,
                    amount,
                } => {
                    self.token_mut(&token.address)?
                        .transfer(operator, from, to, token.token_id, *amount)?;
                }
                Operation::MintOrBurn {
                    lqt_address,
                    target,
                    quantity,
                } => {
                    // The exchange that owns this liquidity token is the caller
                    let admin = self
                        .exchanges
                        .values()
                        .find(|ex| ex.lqt_address() == lqt_address)
                        .map(|ex| ex.address().clone())
                        .ok_or_else(|| DexterError::UnknownContract(lqt_address.clone()))?;
                    let lqt = self
                        .lqt_tokens
                        .get_mut(lqt_address)
                        .ok_or_else(|| DexterError::UnknownContract(lqt_address.clone()))?;
                    lqt.mint_or_burn(&admin, target, *quantity)?;
                }
                Operation::BalanceRequest {
                    token,
                    owner,
                    callback,
                } => {
                    self.pending.push_back(PendingCallback {
                        token: token.clone(),
                        owner: owner.clone(),
                        callback: callback.clone(),
                    });
                }
                Operation::SetDelegate { exchange, baker } => match baker {
                    Some(baker) => log::info!("{} delegates to {}", exchange, baker),
                    None => log::info!("{} withdraws its delegation", exchange),
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::TokenToXtz;
    use crate::token::TokenError;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn setup() -> (Sandbox, Address, TokenRef) {
        let mut ledger = Sandbox::new(addr("factory"), addr("reserve"), 0);
        let token = TokenRef::single("kusd");
        ledger.originate_fa12(token.address.clone());
        ledger.fund(&addr("alice"), 1_000_000).unwrap();
        ledger.mint_tokens(&token, &addr("alice"), 1_000_000).unwrap();
        ledger.authorize(&token, &addr("alice"), &addr("factory"), 500_000).unwrap();
        let dex = ledger
            .launch_exchange(&addr("alice"), token.clone(), 500_000, 100_000)
            .unwrap();
        (ledger, dex, token)
    }

    #[test]
    fn test_launch_moves_funds() {
        let (ledger, dex, token) = setup();
        assert_eq!(ledger.balance(&dex), 100_000);
        assert_eq!(ledger.balance(&addr("alice")), 900_000);
        assert_eq!(ledger.token_balance(&token, &dex), 500_000);
        assert_eq!(ledger.lqt_balance(&dex, &addr("alice")), 100_000);
        assert_eq!(ledger.balance(&addr("factory")), 0);
    }

    #[test]
    fn test_failed_operation_reverts_engine_state() {
        let (mut ledger, dex, _) = setup();
        let before = ledger.exchange(&dex).cloned();

        // No allowance for the exchange: the token pull fails after the
        // engine has already priced and applied the trade
        let sell = ExchangeInstruction::TokenToXtz(TokenToXtz {
            to: addr("alice"),
            tokens_sold: 1_000,
            min_xtz_bought: 0,
            deadline: 10,
        });
        let err = ledger.call(&dex, &addr("alice"), 0, &sell).unwrap_err();

        assert!(matches!(err, DexterError::Token(TokenError::NotEnoughAllowance { .. })));
        assert_eq!(ledger.exchange(&dex).cloned(), before);
        assert_eq!(ledger.balance(&addr("alice")), 900_000);
    }

    #[test]
    fn test_native_shortfall_rejected() {
        let (mut ledger, dex, _) = setup();
        let err = ledger
            .call(&dex, &addr("bob"), 5, &ExchangeInstruction::Default)
            .unwrap_err();
        assert!(matches!(err, DexterError::NativeBalance { required: 5, .. }));
        assert_eq!(err.code(), None);
    }
}
