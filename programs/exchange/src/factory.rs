//! Exchange factory and token registry
//!
//! One exchange per token. The factory is the manager of every exchange it
//! launches, but it has no say over their reserves after launch.

use crate::error::{DexterError, Result};
use crate::operation::Operation;
use crate::state::{Exchange, ExchangeInit};
use crate::types::{Address, Context, TokenRef};
use serde::Serialize;
use std::collections::BTreeMap;

/// A freshly launched exchange and the operations that fund it
#[derive(Debug, Clone)]
pub struct Launch {
    pub exchange: Exchange,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeFactory {
    address: Address,
    /// Reserve assigned to every new exchange
    default_reserve: Address,
    counter: u64,
    swaps: BTreeMap<u64, Address>,
    token_to_swaps: BTreeMap<TokenRef, Address>,
}

impl ExchangeFactory {
    pub fn new(address: Address, default_reserve: Address) -> Self {
        Self {
            address,
            default_reserve,
            counter: 0,
            swaps: BTreeMap::new(),
            token_to_swaps: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn default_reserve(&self) -> &Address {
        &self.default_reserve
    }

    /// Number of exchanges launched so far
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn exchange_at(&self, index: u64) -> Option<&Address> {
        self.swaps.get(&index)
    }

    pub fn exchange_for(&self, token: &TokenRef) -> Option<&Address> {
        self.token_to_swaps.get(token)
    }

    /// Launch an exchange for `token`, seeded with `ctx.amount` xtz and
    /// `token_amount` tokens from `ctx.sender`
    ///
    /// # Returns
    /// * `Launch` with the new exchange and its funding operations: token
    ///   pull from the launcher, xtz forward from the factory, lqt mint
    /// * `DuplicateToken` if `token` already has an exchange
    /// * `InsufficientLiquidity` if either seed amount is zero
    pub fn launch_exchange(
        &mut self,
        ctx: &Context,
        token: TokenRef,
        token_amount: u128,
    ) -> Result<Launch> {
        if self.token_to_swaps.contains_key(&token) {
            log::warn!("launch_exchange: {} already has an exchange", token);
            return Err(DexterError::DuplicateToken);
        }

        let lqt_seed = i128::try_from(ctx.amount).map_err(|_| DexterError::Overflow)?;
        let index = self.counter;
        let next_counter = index.checked_add(1).ok_or(DexterError::Overflow)?;
        let address = Address::originated(&self.address, "exchange", index);
        let lqt_address = Address::originated(&self.address, "lqt", index);

        let exchange = Exchange::initialize(ExchangeInit {
            address: address.clone(),
            token: token.clone(),
            lqt_address: lqt_address.clone(),
            manager: self.address.clone(),
            reserve: self.default_reserve.clone(),
            launcher: ctx.sender.clone(),
            xtz_pool: ctx.amount,
            token_pool: token_amount,
        })?;

        let operations = vec![
            Operation::TokenTransfer {
                token: token.clone(),
                operator: self.address.clone(),
                from: ctx.sender.clone(),
                to: address.clone(),
                amount: token_amount,
            },
            Operation::Send {
                from: self.address.clone(),
                to: address.clone(),
                amount: ctx.amount,
            },
            Operation::MintOrBurn {
                lqt_address,
                target: ctx.sender.clone(),
                quantity: lqt_seed,
            },
        ];

        self.swaps.insert(index, address.clone());
        self.token_to_swaps.insert(token.clone(), address.clone());
        self.counter = next_counter;

        log::info!("Launched exchange #{} for {} at {}", index, token, address);
        Ok(Launch {
            exchange,
            operations,
        })
    }
}
