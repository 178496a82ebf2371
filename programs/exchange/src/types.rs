//! Ledger primitives shared by every module

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account or contract address
///
/// Opaque to the engine: only compared for equality and used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Address of a contract originated by `originator`
    ///
    /// Deterministic, so a replayed scenario produces the same addresses.
    pub fn originated(originator: &Address, kind: &str, nonce: u64) -> Self {
        Self(format!("{}.{}.{}", originator.0, kind, nonce))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A fungible token: contract address plus token id
///
/// FA1.2 contracts hold a single asset and ignore `token_id` (use 0).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenRef {
    pub address: Address,
    pub token_id: u64,
}

impl TokenRef {
    pub fn new(address: impl Into<Address>, token_id: u64) -> Self {
        Self {
            address: address.into(),
            token_id,
        }
    }

    /// Single-asset token (FA1.2)
    pub fn single(address: impl Into<Address>) -> Self {
        Self::new(address, 0)
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.token_id == 0 {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{}#{}", self.address, self.token_id)
        }
    }
}

/// Call context supplied by the hosting ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Immediate caller (an account or another contract)
    pub sender: Address,
    /// Account that signed the outer transaction
    pub source: Address,
    /// Native asset attached to the call (mutez)
    pub amount: u128,
    /// Current time (unix seconds)
    pub now: i64,
}

impl Context {
    /// Call made directly by an account
    pub fn new(sender: Address, amount: u128, now: i64) -> Self {
        Self {
            source: sender.clone(),
            sender,
            amount,
            now,
        }
    }

    /// Call made by a contract on behalf of `source`
    pub fn internal(sender: Address, source: Address, amount: u128, now: i64) -> Self {
        Self {
            sender,
            source,
            amount,
            now,
        }
    }
}
