//! Token pool refresh
//!
//! `update_token_pool` asks the token contract for the exchange's real
//! balance. Until the answer arrives through `update_token_pool_internal`,
//! the exchange is busy and every other entry point fails.

use crate::error::{DexterError, Result, Role};
use crate::operation::Operation;
use crate::state::{ensure_no_amount, Exchange};
use crate::types::Context;

/// Process update_token_pool
///
/// Only callable directly by an account, never through another contract.
pub fn process_update_token_pool(exchange: &mut Exchange, ctx: &Context) -> Result<Vec<Operation>> {
    if ctx.sender != ctx.source {
        return Err(DexterError::NotImplicitAccount);
    }
    ensure_no_amount(ctx)?;
    exchange.ensure_not_updating()?;

    exchange.updating_token_pool = true;
    log::info!("{}: token pool update requested", exchange.address);

    Ok(vec![Operation::BalanceRequest {
        token: exchange.token.clone(),
        owner: exchange.address.clone(),
        callback: exchange.address.clone(),
    }])
}

/// Process update_token_pool_internal (balance callback)
///
/// Accepted only while an update is pending and only from the token
/// contract.
pub fn process_update_token_pool_internal(
    exchange: &mut Exchange,
    ctx: &Context,
    balance: u128,
) -> Result<Vec<Operation>> {
    if !exchange.updating_token_pool || ctx.sender != exchange.token.address {
        return Err(DexterError::NotAuthorized(Role::TokenContract));
    }
    ensure_no_amount(ctx)?;

    log::info!(
        "{}: token pool {} -> {}",
        exchange.address,
        exchange.token_pool,
        balance
    );
    exchange.token_pool = balance;
    exchange.updating_token_pool = false;
    exchange.history.record_pools(exchange.xtz_pool, balance);
    Ok(Vec::new())
}
