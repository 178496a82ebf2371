//! Token contracts: FA1.2 and FA2 behind one interface
//!
//! The exchange only ever emits `TokenTransfer` / `BalanceRequest`
//! operations. The ledger resolves the contract address to a
//! `dyn TokenContract` and the implementation decides how transfers are
//! authorized (allowances for FA1.2, operators for FA2).

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("{owner} holds {balance}, needs {required}")]
    NotEnoughBalance {
        owner: Address,
        balance: u128,
        required: u128,
    },
    #[error("{spender} may spend {allowance} of {owner}'s tokens, needs {required}")]
    NotEnoughAllowance {
        owner: Address,
        spender: Address,
        allowance: u128,
        required: u128,
    },
    #[error("allowance must be reset to zero before it is changed")]
    UnsafeAllowanceChange,
    #[error("{operator} is not an operator for {owner}")]
    NotOperator { owner: Address, operator: Address },
    #[error("token id {0} is undefined")]
    UndefinedTokenId(u64),
    #[error("only the admin may mint or burn")]
    NotAdmin,
    #[error("supply overflow")]
    Overflow,
}

pub type TokenResult<T> = std::result::Result<T, TokenError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStandard {
    Fa12,
    Fa2,
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStandard::Fa12 => f.write_str("FA1.2"),
            TokenStandard::Fa2 => f.write_str("FA2"),
        }
    }
}

/// Capabilities the exchange needs from a token contract
pub trait TokenContract: fmt::Debug {
    fn standard(&self) -> TokenStandard;

    fn balance_of(&self, owner: &Address, token_id: u64) -> u128;

    /// Move `amount` from `from` to `to` on behalf of `operator`
    fn transfer(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        token_id: u64,
        amount: u128,
    ) -> TokenResult<()>;

    /// Create new tokens (test faucet)
    fn mint(&mut self, owner: &Address, token_id: u64, amount: u128) -> TokenResult<()>;

    /// Let `spender` move `owner`'s tokens
    ///
    /// FA1.2: sets the allowance to `amount`. FA2: adds `spender` as an
    /// operator (`amount` is ignored; zero removes the operator).
    fn authorize(
        &mut self,
        owner: &Address,
        spender: &Address,
        token_id: u64,
        amount: u128,
    ) -> TokenResult<()>;

    fn clone_box(&self) -> Box<dyn TokenContract>;
}

impl Clone for Box<dyn TokenContract> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn debit(
    ledger: &mut BTreeMap<Address, u128>,
    owner: &Address,
    amount: u128,
) -> TokenResult<()> {
    let balance = ledger.get(owner).copied().unwrap_or(0);
    if balance < amount {
        return Err(TokenError::NotEnoughBalance {
            owner: owner.clone(),
            balance,
            required: amount,
        });
    }
    if balance == amount {
        ledger.remove(owner);
    } else {
        ledger.insert(owner.clone(), balance - amount);
    }
    Ok(())
}

fn credit(ledger: &mut BTreeMap<Address, u128>, owner: &Address, amount: u128) -> TokenResult<()> {
    if amount == 0 {
        return Ok(());
    }
    let entry = ledger.entry(owner.clone()).or_insert(0);
    *entry = entry.checked_add(amount).ok_or(TokenError::Overflow)?;
    Ok(())
}

// ============================================================================
// FA1.2
// ============================================================================

/// Single-asset token with allowances
///
/// Also used for the liquidity token of each exchange, where `admin` is the
/// exchange and only it may call [`Fa12Token::mint_or_burn`].
#[derive(Debug, Clone, Default)]
pub struct Fa12Token {
    ledger: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
    total_supply: u128,
    admin: Option<Address>,
}

impl Fa12Token {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(admin: Address) -> Self {
        Self {
            admin: Some(admin),
            ..Self::default()
        }
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// FA1.2 `approve`: a non-zero allowance can only be set from zero
    pub fn approve(&mut self, owner: &Address, spender: &Address, value: u128) -> TokenResult<()> {
        let key = (owner.clone(), spender.clone());
        let current = self.allowances.get(&key).copied().unwrap_or(0);
        if current > 0 && value > 0 {
            return Err(TokenError::UnsafeAllowanceChange);
        }
        if value == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, value);
        }
        Ok(())
    }

    /// Admin-only supply change; negative quantities burn
    pub fn mint_or_burn(
        &mut self,
        caller: &Address,
        target: &Address,
        quantity: i128,
    ) -> TokenResult<()> {
        if self.admin.as_ref() != Some(caller) {
            return Err(TokenError::NotAdmin);
        }
        let magnitude = quantity.unsigned_abs();
        if quantity >= 0 {
            credit(&mut self.ledger, target, magnitude)?;
            self.total_supply = self
                .total_supply
                .checked_add(magnitude)
                .ok_or(TokenError::Overflow)?;
        } else {
            debit(&mut self.ledger, target, magnitude)?;
            self.total_supply -= magnitude;
        }
        Ok(())
    }
}

impl TokenContract for Fa12Token {
    fn standard(&self) -> TokenStandard {
        TokenStandard::Fa12
    }

    fn balance_of(&self, owner: &Address, _token_id: u64) -> u128 {
        self.ledger.get(owner).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        _token_id: u64,
        amount: u128,
    ) -> TokenResult<()> {
        if operator != from {
            let allowance = self.allowance(from, operator);
            if allowance < amount {
                return Err(TokenError::NotEnoughAllowance {
                    owner: from.clone(),
                    spender: operator.clone(),
                    allowance,
                    required: amount,
                });
            }
            let key = (from.clone(), operator.clone());
            if allowance == amount {
                self.allowances.remove(&key);
            } else {
                self.allowances.insert(key, allowance - amount);
            }
        }
        debit(&mut self.ledger, from, amount)?;
        credit(&mut self.ledger, to, amount)
    }

    fn mint(&mut self, owner: &Address, _token_id: u64, amount: u128) -> TokenResult<()> {
        credit(&mut self.ledger, owner, amount)?;
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Ok(())
    }

    fn authorize(
        &mut self,
        owner: &Address,
        spender: &Address,
        _token_id: u64,
        amount: u128,
    ) -> TokenResult<()> {
        self.approve(owner, spender, amount)
    }

    fn clone_box(&self) -> Box<dyn TokenContract> {
        Box::new(self.clone())
    }
}

// ============================================================================
// FA2
// ============================================================================

/// Multi-asset token with operators
#[derive(Debug, Clone, Default)]
pub struct Fa2Token {
    ledger: BTreeMap<u64, BTreeMap<Address, u128>>,
    /// (owner, operator, token_id)
    operators: BTreeSet<(Address, Address, u64)>,
    supply: BTreeMap<u64, u128>,
}

impl Fa2Token {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self, token_id: u64) -> u128 {
        self.supply.get(&token_id).copied().unwrap_or(0)
    }

    pub fn is_operator(&self, owner: &Address, operator: &Address, token_id: u64) -> bool {
        self.operators
            .contains(&(owner.clone(), operator.clone(), token_id))
    }
}

impl TokenContract for Fa2Token {
    fn standard(&self) -> TokenStandard {
        TokenStandard::Fa2
    }

    fn balance_of(&self, owner: &Address, token_id: u64) -> u128 {
        self.ledger
            .get(&token_id)
            .and_then(|holders| holders.get(owner))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        token_id: u64,
        amount: u128,
    ) -> TokenResult<()> {
        if !self.supply.contains_key(&token_id) {
            return Err(TokenError::UndefinedTokenId(token_id));
        }
        if operator != from && !self.is_operator(from, operator, token_id) {
            return Err(TokenError::NotOperator {
                owner: from.clone(),
                operator: operator.clone(),
            });
        }
        let holders = self.ledger.entry(token_id).or_default();
        debit(holders, from, amount)?;
        credit(holders, to, amount)
    }

    fn mint(&mut self, owner: &Address, token_id: u64, amount: u128) -> TokenResult<()> {
        let supply = self.supply.entry(token_id).or_insert(0);
        *supply = supply.checked_add(amount).ok_or(TokenError::Overflow)?;
        credit(self.ledger.entry(token_id).or_default(), owner, amount)
    }

    fn authorize(
        &mut self,
        owner: &Address,
        spender: &Address,
        token_id: u64,
        amount: u128,
    ) -> TokenResult<()> {
        let key = (owner.clone(), spender.clone(), token_id);
        if amount == 0 {
            self.operators.remove(&key);
        } else {
            self.operators.insert(key);
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn TokenContract> {
        Box::new(self.clone())
    }
}
