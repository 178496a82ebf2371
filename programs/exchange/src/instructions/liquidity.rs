//! Liquidity provision: add and remove

use super::{AddLiquidity, RemoveLiquidity};
use crate::error::{DexterError, Result, Slippage};
use crate::operation::{push_send, Operation};
use crate::state::{ensure_deadline, ensure_no_amount, Direction, Exchange};
use crate::types::{Address, Context};
use dex_model::{lqt_minted, share_of, tokens_deposited};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityPlan {
    pub xtz_in: u128,
    pub lqt_minted: u128,
    /// `lqt_minted` as a signed mint quantity for the lqt token
    pub mint_quantity: i128,
    pub tokens_deposited: u128,
    pub new_xtz_pool: u128,
    pub new_token_pool: u128,
    pub new_lqt_total: u128,
    pub new_owner_balance: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidityPlan {
    pub lqt_burned: u128,
    /// Negative quantity burned on the lqt token
    pub burn_quantity: i128,
    pub xtz_withdrawn: u128,
    pub tokens_withdrawn: u128,
    pub new_xtz_pool: u128,
    pub new_token_pool: u128,
    pub new_lqt_total: u128,
    pub new_sender_balance: u128,
}

// ============================================================================
// Add
// ============================================================================

/// Price a deposit of `ctx.amount` xtz
///
/// Minted units round down, required tokens round up.
pub fn plan_add_liquidity(
    exchange: &Exchange,
    ctx: &Context,
    params: &AddLiquidity,
) -> Result<AddLiquidityPlan> {
    exchange.ensure_not_updating()?;
    ensure_deadline(ctx, params.deadline)?;

    let xtz_in = ctx.amount;
    let minted = lqt_minted(xtz_in, exchange.lqt_total, exchange.xtz_pool)?;
    let deposited = tokens_deposited(xtz_in, exchange.token_pool, exchange.xtz_pool)?;

    if minted < params.min_lqt_minted {
        return Err(DexterError::SlippageExceeded(Slippage::LqtMinted));
    }
    if deposited > params.max_tokens_deposited {
        return Err(DexterError::MaxDepositExceeded);
    }
    let mint_quantity = i128::try_from(minted).map_err(|_| DexterError::Overflow)?;

    let new_xtz_pool = exchange.xtz_pool.checked_add(xtz_in);
    let new_token_pool = exchange.token_pool.checked_add(deposited);
    let new_lqt_total = exchange.lqt_total.checked_add(minted);
    let new_owner_balance = exchange.liquidity_balance(&params.owner).checked_add(minted);

    match (new_xtz_pool, new_token_pool, new_lqt_total, new_owner_balance) {
        (Some(new_xtz_pool), Some(new_token_pool), Some(new_lqt_total), Some(new_owner_balance)) => {
            Ok(AddLiquidityPlan {
                xtz_in,
                lqt_minted: minted,
                mint_quantity,
                tokens_deposited: deposited,
                new_xtz_pool,
                new_token_pool,
                new_lqt_total,
                new_owner_balance,
            })
        }
        _ => Err(DexterError::Overflow),
    }
}

/// Apply a deposit; tokens are pulled from `ctx.sender`, units go to `owner`
pub fn apply_add_liquidity(
    exchange: &mut Exchange,
    ctx: &Context,
    owner: &Address,
    plan: &AddLiquidityPlan,
) -> Vec<Operation> {
    exchange.set_pools(plan.new_xtz_pool, plan.new_token_pool);
    exchange.set_liquidity(owner, plan.new_owner_balance, plan.new_lqt_total);
    exchange
        .history
        .record_pools(plan.new_xtz_pool, plan.new_token_pool);
    exchange
        .history
        .record_investment(owner, Direction::Add, plan.xtz_in, plan.tokens_deposited);

    vec![
        Operation::TokenTransfer {
            token: exchange.token.clone(),
            operator: exchange.address.clone(),
            from: ctx.sender.clone(),
            to: exchange.address.clone(),
            amount: plan.tokens_deposited,
        },
        Operation::MintOrBurn {
            lqt_address: exchange.lqt_address.clone(),
            target: owner.clone(),
            quantity: plan.mint_quantity,
        },
    ]
}

/// Process add_liquidity
///
/// # Arguments
/// * `exchange` - Exchange receiving the deposit
/// * `ctx` - Call context; `ctx.amount` is the native deposit
/// * `params` - Owner of the minted units, bounds and deadline
pub fn process_add_liquidity(
    exchange: &mut Exchange,
    ctx: &Context,
    params: &AddLiquidity,
) -> Result<Vec<Operation>> {
    let plan = plan_add_liquidity(exchange, ctx, params)?;
    log::debug!(
        "add_liquidity: xtz_in={} tokens_deposited={} lqt_minted={}",
        plan.xtz_in,
        plan.tokens_deposited,
        plan.lqt_minted
    );
    Ok(apply_add_liquidity(exchange, ctx, &params.owner, &plan))
}

// ============================================================================
// Remove
// ============================================================================

/// Price a withdrawal of `lqt_burned` units held by `ctx.sender`
///
/// Burning the entire supply is refused: an exchange never returns to
/// zero liquidity once launched.
pub fn plan_remove_liquidity(
    exchange: &Exchange,
    ctx: &Context,
    params: &RemoveLiquidity,
) -> Result<RemoveLiquidityPlan> {
    exchange.ensure_not_updating()?;
    ensure_deadline(ctx, params.deadline)?;
    ensure_no_amount(ctx)?;
    exchange.ensure_external(&params.to)?;

    let lqt_burned = params.lqt_burned;
    let xtz_withdrawn = share_of(lqt_burned, exchange.xtz_pool, exchange.lqt_total)?;
    let tokens_withdrawn = share_of(lqt_burned, exchange.token_pool, exchange.lqt_total)?;

    if xtz_withdrawn < params.min_xtz_withdrawn {
        return Err(DexterError::SlippageExceeded(Slippage::XtzWithdrawn));
    }
    if tokens_withdrawn < params.min_tokens_withdrawn {
        return Err(DexterError::SlippageExceeded(Slippage::TokensWithdrawn));
    }

    let balance = exchange.liquidity_balance(&ctx.sender);
    if balance < lqt_burned {
        return Err(DexterError::InsufficientBalance);
    }
    if lqt_burned >= exchange.lqt_total {
        return Err(DexterError::InsufficientLiquidity);
    }

    let burn_quantity = i128::try_from(lqt_burned)
        .map(|q| -q)
        .map_err(|_| DexterError::Overflow)?;

    // lqt_burned < lqt_total, so each share is strictly below its pool
    Ok(RemoveLiquidityPlan {
        lqt_burned,
        burn_quantity,
        xtz_withdrawn,
        tokens_withdrawn,
        new_xtz_pool: exchange.xtz_pool - xtz_withdrawn,
        new_token_pool: exchange.token_pool - tokens_withdrawn,
        new_lqt_total: exchange.lqt_total - lqt_burned,
        new_sender_balance: balance - lqt_burned,
    })
}

/// Apply a withdrawal; both assets go to `to`
pub fn apply_remove_liquidity(
    exchange: &mut Exchange,
    ctx: &Context,
    to: &Address,
    plan: &RemoveLiquidityPlan,
) -> Vec<Operation> {
    exchange.set_pools(plan.new_xtz_pool, plan.new_token_pool);
    exchange.set_liquidity(&ctx.sender, plan.new_sender_balance, plan.new_lqt_total);
    exchange
        .history
        .record_pools(plan.new_xtz_pool, plan.new_token_pool);
    exchange.history.record_investment(
        &ctx.sender,
        Direction::Remove,
        plan.xtz_withdrawn,
        plan.tokens_withdrawn,
    );

    let mut ops = vec![
        Operation::MintOrBurn {
            lqt_address: exchange.lqt_address.clone(),
            target: ctx.sender.clone(),
            quantity: plan.burn_quantity,
        },
        Operation::TokenTransfer {
            token: exchange.token.clone(),
            operator: exchange.address.clone(),
            from: exchange.address.clone(),
            to: to.clone(),
            amount: plan.tokens_withdrawn,
        },
    ];
    push_send(&mut ops, &exchange.address, to, plan.xtz_withdrawn);
    ops
}

/// Process remove_liquidity
///
/// # Arguments
/// * `exchange` - Exchange paying out
/// * `ctx` - Call context; units are burned from `ctx.sender`
/// * `params` - Recipient, units burned, minimum payouts and deadline
pub fn process_remove_liquidity(
    exchange: &mut Exchange,
    ctx: &Context,
    params: &RemoveLiquidity,
) -> Result<Vec<Operation>> {
    let plan = plan_remove_liquidity(exchange, ctx, params)?;
    log::debug!(
        "remove_liquidity: lqt_burned={} xtz_withdrawn={} tokens_withdrawn={}",
        plan.lqt_burned,
        plan.xtz_withdrawn,
        plan.tokens_withdrawn
    );
    Ok(apply_remove_liquidity(exchange, ctx, &params.to, &plan))
}
