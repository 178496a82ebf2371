//! Exchange error taxonomy
//!
//! Every engine error is raised before any state is touched, so a failed
//! call leaves the exchange exactly as it was.

use crate::token::TokenError;
use crate::types::Address;
use dex_model::DexMathError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DexterError>;

/// Which minimum (or maximum) a trade or liquidity call failed to meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slippage {
    TokensBought,
    XtzBought,
    LqtMinted,
    XtzWithdrawn,
    TokensWithdrawn,
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slippage::TokensBought => "tokens bought",
            Slippage::XtzBought => "xtz bought",
            Slippage::LqtMinted => "lqt minted",
            Slippage::XtzWithdrawn => "xtz withdrawn",
            Slippage::TokensWithdrawn => "tokens withdrawn",
        };
        f.write_str(name)
    }
}

/// Role a privileged entry point expected the sender to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reserve,
    Manager,
    TokenContract,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Reserve => "reserve",
            Role::Manager => "manager",
            Role::TokenContract => "token contract",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexterError {
    #[error("the current time must be less than or equal to the deadline")]
    Expired,
    #[error("{0} is below the requested minimum")]
    SlippageExceeded(Slippage),
    #[error("tokens deposited would exceed max_tokens_deposited")]
    MaxDepositExceeded,
    #[error("insufficient liquidity in pool")]
    InsufficientLiquidity,
    #[error("insufficient liquidity balance")]
    InsufficientBalance,
    #[error("sender is not the {0}")]
    NotAuthorized(Role),
    #[error("an exchange for this token already exists")]
    DuplicateToken,
    #[error("token pool update in progress")]
    Busy,
    #[error("amount must be zero")]
    NonZeroAmount,
    #[error("baker is permanently frozen")]
    BakerFrozen,
    #[error("output exchange is invalid")]
    InvalidIntermediate,
    #[error("the exchange cannot pay itself")]
    SelfRecipient,
    #[error("sender must be the transaction source")]
    NotImplicitAccount,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("token contract rejected the transfer: {0}")]
    Token(#[from] TokenError),
    #[error("{account} holds {balance} mutez, needs {required}")]
    NativeBalance {
        account: Address,
        balance: u128,
        required: u128,
    },
    #[error("unknown contract {0}")]
    UnknownContract(Address),
}

impl DexterError {
    /// Numeric failure code raised by the on-chain contracts
    ///
    /// `None` for failures that belong to the hosting ledger rather than
    /// the exchange (token contracts, native balances, unknown addresses),
    /// and for `SelfRecipient`, which the contracts never raise.
    pub fn code(&self) -> Option<u32> {
        let code = match self {
            DexterError::Busy => 2,
            DexterError::Expired => 3,
            DexterError::DuplicateToken => 3,
            DexterError::MaxDepositExceeded => 4,
            DexterError::SlippageExceeded(Slippage::LqtMinted) => 5,
            DexterError::SlippageExceeded(Slippage::XtzBought) => 8,
            DexterError::NonZeroAmount => 10,
            DexterError::SlippageExceeded(Slippage::XtzWithdrawn) => 11,
            DexterError::SlippageExceeded(Slippage::TokensWithdrawn) => 13,
            DexterError::InsufficientBalance => 14,
            DexterError::SlippageExceeded(Slippage::TokensBought) => 18,
            DexterError::InsufficientLiquidity => 19,
            DexterError::NotAuthorized(Role::Manager) => 20,
            DexterError::BakerFrozen => 22,
            DexterError::NotImplicitAccount => 25,
            DexterError::NotAuthorized(Role::TokenContract) => 29,
            DexterError::InvalidIntermediate => 31,
            DexterError::NotAuthorized(Role::Reserve) => 40,
            DexterError::Overflow => 50,
            DexterError::SelfRecipient
            | DexterError::Token(_)
            | DexterError::NativeBalance { .. }
            | DexterError::UnknownContract(_) => return None,
        };
        Some(code)
    }
}

impl From<DexMathError> for DexterError {
    fn from(e: DexMathError) -> Self {
        match e {
            DexMathError::InsufficientLiquidity => DexterError::InsufficientLiquidity,
            DexMathError::Overflow => DexterError::Overflow,
        }
    }
}
