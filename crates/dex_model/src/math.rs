//! Constant product pricing (x·y=k) with the Dexter fee split

use crate::{DexMathError, FEE_DENOMINATOR, FEE_NUMERATOR, RESERVE_FEE_NUMERATOR};

type Result<T> = core::result::Result<T, DexMathError>;

/// Amount received when selling `input` into a constant product pool
///
/// Formula (fee on input, 0.28% total):
/// - out = floor(input·9972·output_pool / (input_pool·10000 + input·9972))
///
/// # Arguments
/// * `input` - Amount sold into the pool
/// * `input_pool` - Pool of the asset being sold (pre-trade)
/// * `output_pool` - Pool of the asset being bought (pre-trade)
///
/// # Returns
/// * Output amount, strictly below `output_pool`
/// * `InsufficientLiquidity` if the pool would be drained or is empty
pub fn swap_output(input: u128, input_pool: u128, output_pool: u128) -> Result<u128> {
    let input_with_fee = input.checked_mul(FEE_NUMERATOR).ok_or(DexMathError::Overflow)?;
    let numerator = input_with_fee
        .checked_mul(output_pool)
        .ok_or(DexMathError::Overflow)?;
    let denominator = input_pool
        .checked_mul(FEE_DENOMINATOR)
        .and_then(|d| d.checked_add(input_with_fee))
        .ok_or(DexMathError::Overflow)?;

    if denominator == 0 {
        return Err(DexMathError::InsufficientLiquidity);
    }

    let output = numerator / denominator;
    if output >= output_pool {
        return Err(DexMathError::InsufficientLiquidity);
    }

    Ok(output)
}

/// Reserve fee charged on a trade, measured in the output asset
///
/// Runs the 0.03% reserve share through the same curve as the trade:
/// - fee = floor(input·3·output_pool / (input_pool·10000 + input·3))
///
/// Both pools are pre-trade values.
pub fn reserve_fee(input: u128, input_pool: u128, output_pool: u128) -> Result<u128> {
    let input_share = input
        .checked_mul(RESERVE_FEE_NUMERATOR)
        .ok_or(DexMathError::Overflow)?;
    let numerator = input_share
        .checked_mul(output_pool)
        .ok_or(DexMathError::Overflow)?;
    let denominator = input_pool
        .checked_mul(FEE_DENOMINATOR)
        .and_then(|d| d.checked_add(input_share))
        .ok_or(DexMathError::Overflow)?;

    if denominator == 0 {
        return Err(DexMathError::InsufficientLiquidity);
    }

    Ok(numerator / denominator)
}

/// Reserve fee when the input itself is the native asset
///
/// The fee is taken straight off the input: floor(xtz_in·3/10000).
pub fn reserve_fee_native_in(xtz_in: u128) -> Result<u128> {
    xtz_in
        .checked_mul(RESERVE_FEE_NUMERATOR)
        .map(|v| v / FEE_DENOMINATOR)
        .ok_or(DexMathError::Overflow)
}

/// Native-asset volume of a token sale, for the history record
///
/// volume = floor(tokens_sold·xtz_pool / (token_pool + tokens_sold)), pre-trade pools.
pub fn xtz_volume(tokens_sold: u128, token_pool: u128, xtz_pool: u128) -> Result<u128> {
    let numerator = tokens_sold
        .checked_mul(xtz_pool)
        .ok_or(DexMathError::Overflow)?;
    let denominator = token_pool
        .checked_add(tokens_sold)
        .ok_or(DexMathError::Overflow)?;

    if denominator == 0 {
        return Err(DexMathError::InsufficientLiquidity);
    }

    Ok(numerator / denominator)
}

/// Liquidity units minted for a native deposit: floor(xtz_in·lqt_total/xtz_pool)
pub fn lqt_minted(xtz_in: u128, lqt_total: u128, xtz_pool: u128) -> Result<u128> {
    if xtz_pool == 0 {
        return Err(DexMathError::InsufficientLiquidity);
    }
    let numerator = xtz_in.checked_mul(lqt_total).ok_or(DexMathError::Overflow)?;
    Ok(numerator / xtz_pool)
}

/// Tokens a liquidity provider must deposit alongside `xtz_in`
///
/// Rounds up so the pool never loses value to the depositor:
/// ceil(xtz_in·token_pool/xtz_pool).
pub fn tokens_deposited(xtz_in: u128, token_pool: u128, xtz_pool: u128) -> Result<u128> {
    let numerator = xtz_in.checked_mul(token_pool).ok_or(DexMathError::Overflow)?;
    ceil_div(numerator, xtz_pool)
}

/// Proportional share of `pool` owned by `lqt_burned` units: floor(lqt_burned·pool/lqt_total)
pub fn share_of(lqt_burned: u128, pool: u128, lqt_total: u128) -> Result<u128> {
    if lqt_total == 0 {
        return Err(DexMathError::InsufficientLiquidity);
    }
    let numerator = lqt_burned.checked_mul(pool).ok_or(DexMathError::Overflow)?;
    Ok(numerator / lqt_total)
}

/// Ceiling division; errors on a zero denominator
pub fn ceil_div(numerator: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(DexMathError::InsufficientLiquidity);
    }
    if numerator == 0 {
        return Ok(0);
    }
    Ok((numerator - 1) / denominator + 1)
}
