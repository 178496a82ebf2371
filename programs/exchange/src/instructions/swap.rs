//! Single-leg swaps against one exchange

use super::{TokenToXtz, XtzToToken};
use crate::error::{DexterError, Result, Slippage};
use crate::operation::{push_send, Operation};
use crate::state::{ensure_deadline, ensure_no_amount, Exchange};
use crate::types::{Address, Context};
use dex_model::{reserve_fee, reserve_fee_native_in, swap_output, xtz_volume};

/// Priced xtz -> token trade, not yet applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XtzToTokenPlan {
    pub xtz_in: u128,
    pub reserve_fee: u128,
    pub tokens_bought: u128,
    pub new_xtz_pool: u128,
    pub new_token_pool: u128,
}

/// Priced token -> xtz trade, not yet applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenToXtzPlan {
    pub tokens_sold: u128,
    pub xtz_bought: u128,
    pub reserve_fee: u128,
    pub xtz_volume: u128,
    pub new_xtz_pool: u128,
    pub new_token_pool: u128,
}

// ============================================================================
// xtz -> token
// ============================================================================

/// Price an xtz -> token trade using `ctx.amount` as the input
///
/// The whole input is priced through the curve; the reserve fee
/// (floor(xtz_in·3/10000)) is then withheld from what enters the pool.
pub fn plan_xtz_to_token(
    exchange: &Exchange,
    ctx: &Context,
    params: &XtzToToken,
) -> Result<XtzToTokenPlan> {
    exchange.ensure_not_updating()?;
    ensure_deadline(ctx, params.deadline)?;
    exchange.ensure_external(&params.to)?;

    let xtz_in = ctx.amount;
    let reserve_fee = reserve_fee_native_in(xtz_in)?;
    let tokens_bought = swap_output(xtz_in, exchange.xtz_pool, exchange.token_pool)?;

    if tokens_bought < params.min_tokens_bought {
        return Err(DexterError::SlippageExceeded(Slippage::TokensBought));
    }

    let new_xtz_pool = exchange
        .xtz_pool
        .checked_add(xtz_in - reserve_fee)
        .ok_or(DexterError::Overflow)?;
    // swap_output keeps tokens_bought strictly below the pool
    let new_token_pool = exchange.token_pool - tokens_bought;

    Ok(XtzToTokenPlan {
        xtz_in,
        reserve_fee,
        tokens_bought,
        new_xtz_pool,
        new_token_pool,
    })
}

pub fn apply_xtz_to_token(
    exchange: &mut Exchange,
    to: &Address,
    plan: &XtzToTokenPlan,
) -> Vec<Operation> {
    exchange.set_pools(plan.new_xtz_pool, plan.new_token_pool);
    exchange
        .history
        .record_swap(plan.new_xtz_pool, plan.new_token_pool, plan.xtz_in);

    let mut ops = vec![Operation::TokenTransfer {
        token: exchange.token.clone(),
        operator: exchange.address.clone(),
        from: exchange.address.clone(),
        to: to.clone(),
        amount: plan.tokens_bought,
    }];
    push_send(&mut ops, &exchange.address, &exchange.reserve, plan.reserve_fee);
    ops
}

/// Process xtz_to_token
///
/// # Arguments
/// * `exchange` - Exchange being traded against
/// * `ctx` - Call context; `ctx.amount` is the native input
/// * `params` - Recipient, minimum tokens bought and deadline
pub fn process_xtz_to_token(
    exchange: &mut Exchange,
    ctx: &Context,
    params: &XtzToToken,
) -> Result<Vec<Operation>> {
    let plan = plan_xtz_to_token(exchange, ctx, params)?;
    log::debug!(
        "xtz_to_token: xtz_in={} tokens_bought={} reserve_fee={}",
        plan.xtz_in,
        plan.tokens_bought,
        plan.reserve_fee
    );
    Ok(apply_xtz_to_token(exchange, &params.to, &plan))
}

// ============================================================================
// token -> xtz
// ============================================================================

/// Price a token -> xtz trade
///
/// Both the payout and the reserve fee are taken out of the native pool.
/// The pool may shrink but never to zero.
pub fn plan_token_to_xtz(
    exchange: &Exchange,
    ctx: &Context,
    params: &TokenToXtz,
) -> Result<TokenToXtzPlan> {
    exchange.ensure_not_updating()?;
    ensure_deadline(ctx, params.deadline)?;
    ensure_no_amount(ctx)?;
    exchange.ensure_external(&params.to)?;

    let tokens_sold = params.tokens_sold;
    let xtz_bought = swap_output(tokens_sold, exchange.token_pool, exchange.xtz_pool)?;
    let reserve_fee = reserve_fee(tokens_sold, exchange.token_pool, exchange.xtz_pool)?;

    if xtz_bought < params.min_xtz_bought {
        return Err(DexterError::SlippageExceeded(Slippage::XtzBought));
    }

    let outflow = xtz_bought
        .checked_add(reserve_fee)
        .ok_or(DexterError::Overflow)?;
    let new_xtz_pool = exchange
        .xtz_pool
        .checked_sub(outflow)
        .filter(|pool| *pool > 0)
        .ok_or(DexterError::InsufficientLiquidity)?;
    let new_token_pool = exchange
        .token_pool
        .checked_add(tokens_sold)
        .ok_or(DexterError::Overflow)?;
    let xtz_volume = xtz_volume(tokens_sold, exchange.token_pool, exchange.xtz_pool)?;

    Ok(TokenToXtzPlan {
        tokens_sold,
        xtz_bought,
        reserve_fee,
        xtz_volume,
        new_xtz_pool,
        new_token_pool,
    })
}

/// Apply a token -> xtz plan; tokens are pulled from `ctx.sender`
pub fn apply_token_to_xtz(
    exchange: &mut Exchange,
    ctx: &Context,
    to: &Address,
    plan: &TokenToXtzPlan,
) -> Vec<Operation> {
    exchange.set_pools(plan.new_xtz_pool, plan.new_token_pool);
    exchange
        .history
        .record_swap(plan.new_xtz_pool, plan.new_token_pool, plan.xtz_volume);

    let mut ops = vec![Operation::TokenTransfer {
        token: exchange.token.clone(),
        operator: exchange.address.clone(),
        from: ctx.sender.clone(),
        to: exchange.address.clone(),
        amount: plan.tokens_sold,
    }];
    push_send(&mut ops, &exchange.address, to, plan.xtz_bought);
    push_send(&mut ops, &exchange.address, &exchange.reserve, plan.reserve_fee);
    ops
}

/// Process token_to_xtz
///
/// # Arguments
/// * `exchange` - Exchange being traded against
/// * `ctx` - Call context; tokens are pulled from `ctx.sender`
/// * `params` - Recipient, tokens sold, minimum xtz bought and deadline
pub fn process_token_to_xtz(
    exchange: &mut Exchange,
    ctx: &Context,
    params: &TokenToXtz,
) -> Result<Vec<Operation>> {
    let plan = plan_token_to_xtz(exchange, ctx, params)?;
    log::debug!(
        "token_to_xtz: tokens_sold={} xtz_bought={} reserve_fee={}",
        plan.tokens_sold,
        plan.xtz_bought,
        plan.reserve_fee
    );
    Ok(apply_token_to_xtz(exchange, ctx, &params.to, &plan))
}
