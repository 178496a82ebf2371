//! Effects emitted by the engine for the hosting ledger to execute

use crate::types::{Address, TokenRef};
use serde::Serialize;

/// A side effect of a successful call
///
/// The ledger executes the list in order, atomically with the state change
/// that produced it. If any operation fails, the whole call is reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Native asset transfer
    Send {
        from: Address,
        to: Address,
        amount: u128,
    },
    /// Token transfer requested by `operator` (the emitting contract)
    TokenTransfer {
        token: TokenRef,
        operator: Address,
        from: Address,
        to: Address,
        amount: u128,
    },
    /// Mint (positive) or burn (negative) liquidity units
    MintOrBurn {
        lqt_address: Address,
        target: Address,
        quantity: i128,
    },
    /// Ask `token` for the balance of `owner`, answered to `callback`
    BalanceRequest {
        token: TokenRef,
        owner: Address,
        callback: Address,
    },
    /// Change the delegate of `exchange`
    SetDelegate {
        exchange: Address,
        baker: Option<Address>,
    },
}

/// Append a native transfer, skipping empty ones
pub(crate) fn push_send(ops: &mut Vec<Operation>, from: &Address, to: &Address, amount: u128) {
    if amount > 0 {
        ops.push(Operation::Send {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
    }
}
