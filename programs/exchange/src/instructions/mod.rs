/// Exchange instruction handlers
///
/// Each handler is split into `plan_*` (read-only, all validation) and
/// `apply_*` (infallible). `process_*` runs both.

pub mod receive;
pub mod governance;
pub mod liquidity;
pub mod swap;
pub mod token_pool;
pub mod token_to_token;

pub use receive::*;
pub use governance::*;
pub use liquidity::*;
pub use swap::*;
pub use token_pool::*;
pub use token_to_token::*;

use crate::types::Address;

/// Buy tokens with the attached native amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XtzToToken {
    pub to: Address,
    pub min_tokens_bought: u128,
    pub deadline: i64,
}

/// Sell tokens for native asset (attached amount must be zero)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenToXtz {
    pub to: Address,
    pub tokens_sold: u128,
    pub min_xtz_bought: u128,
    pub deadline: i64,
}

/// Sell this exchange's token for another exchange's token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenToToken {
    pub output_exchange: Address,
    pub to: Address,
    pub tokens_sold: u128,
    pub min_tokens_bought: u128,
    pub deadline: i64,
}

/// Deposit the attached native amount plus matching tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidity {
    pub owner: Address,
    pub min_lqt_minted: u128,
    pub max_tokens_deposited: u128,
    pub deadline: i64,
}

/// Burn liquidity units for a proportional share of both pools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidity {
    pub to: Address,
    pub lqt_burned: u128,
    pub min_xtz_withdrawn: u128,
    pub min_tokens_withdrawn: u128,
    pub deadline: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBaker {
    pub baker: Option<Address>,
    pub freeze_baker: bool,
}

/// Single-exchange entry points
///
/// `token_to_token` touches two exchanges and is dispatched separately
/// (see `process_token_to_token`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeInstruction {
    /// Plain native deposit into the pool
    Default,
    XtzToToken(XtzToToken),
    TokenToXtz(TokenToXtz),
    AddLiquidity(AddLiquidity),
    RemoveLiquidity(RemoveLiquidity),
    /// Hand the reserve role to a new address (reserve only)
    UpdateReserve(Address),
    /// Change the delegate (manager only)
    SetBaker(SetBaker),
    /// Re-read the token balance from the token contract
    UpdateTokenPool,
    /// Balance callback from the token contract
    UpdateTokenPoolInternal(u128),
}

impl ExchangeInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeInstruction::Default => "Default",
            ExchangeInstruction::XtzToToken(_) => "XtzToToken",
            ExchangeInstruction::TokenToXtz(_) => "TokenToXtz",
            ExchangeInstruction::AddLiquidity(_) => "AddLiquidity",
            ExchangeInstruction::RemoveLiquidity(_) => "RemoveLiquidity",
            ExchangeInstruction::UpdateReserve(_) => "UpdateReserve",
            ExchangeInstruction::SetBaker(_) => "SetBaker",
            ExchangeInstruction::UpdateTokenPool => "UpdateTokenPool",
            ExchangeInstruction::UpdateTokenPoolInternal(_) => "UpdateTokenPoolInternal",
        }
    }
}
