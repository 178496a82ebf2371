//! Off-ledger quotes from raw pool figures

use anyhow::Result;
use colored::Colorize;
use dex_model::{
    lqt_minted, reserve_fee, reserve_fee_native_in, share_of, swap_output, tokens_deposited,
    DexMathError,
};
use dexter_exchange::DexterError;

/// Result of a swap quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub bought: u128,
    pub reserve_fee: u128,
    pub new_input_pool: u128,
    pub new_output_pool: u128,
}

fn check(value: core::result::Result<u128, DexMathError>) -> Result<u128> {
    Ok(value.map_err(DexterError::from)?)
}

fn overflow() -> anyhow::Error {
    DexterError::Overflow.into()
}

pub fn quote_xtz_to_token(xtz_pool: u128, token_pool: u128, amount: u128) -> Result<SwapQuote> {
    let bought = check(swap_output(amount, xtz_pool, token_pool))?;
    let fee = check(reserve_fee_native_in(amount))?;
    Ok(SwapQuote {
        bought,
        reserve_fee: fee,
        new_input_pool: xtz_pool.checked_add(amount - fee).ok_or_else(overflow)?,
        new_output_pool: token_pool - bought,
    })
}

pub fn quote_token_to_xtz(xtz_pool: u128, token_pool: u128, amount: u128) -> Result<SwapQuote> {
    let bought = check(swap_output(amount, token_pool, xtz_pool))?;
    let fee = check(reserve_fee(amount, token_pool, xtz_pool))?;
    let new_xtz_pool = bought
        .checked_add(fee)
        .and_then(|outflow| xtz_pool.checked_sub(outflow))
        .filter(|pool| *pool > 0)
        .ok_or(DexterError::InsufficientLiquidity)?;
    Ok(SwapQuote {
        bought,
        reserve_fee: fee,
        new_input_pool: token_pool.checked_add(amount).ok_or_else(overflow)?,
        new_output_pool: new_xtz_pool,
    })
}

/// Two legs: sell into `input` for xtz, spend all of it on `output`
pub fn quote_token_to_token(
    input: (u128, u128),
    output: (u128, u128),
    amount: u128,
) -> Result<(SwapQuote, SwapQuote)> {
    let sell = quote_token_to_xtz(input.0, input.1, amount)?;
    let buy = quote_xtz_to_token(output.0, output.1, sell.bought)?;
    Ok((sell, buy))
}

// ============================================================================
// Commands
// ============================================================================

pub fn xtz_to_token(xtz_pool: u128, token_pool: u128, amount: u128) -> Result<()> {
    let quote = quote_xtz_to_token(xtz_pool, token_pool, amount)?;
    println!("{}", "=== Quote: xtz -> token ===".bright_green().bold());
    println!("{} {}", "xtz sold:".bright_cyan(), amount);
    print_swap(&quote, "tokens");
    Ok(())
}

pub fn token_to_xtz(xtz_pool: u128, token_pool: u128, amount: u128) -> Result<()> {
    let quote = quote_token_to_xtz(xtz_pool, token_pool, amount)?;
    println!("{}", "=== Quote: token -> xtz ===".bright_green().bold());
    println!("{} {}", "Tokens sold:".bright_cyan(), amount);
    print_swap(&quote, "xtz");
    let volume = check(dex_model::xtz_volume(amount, token_pool, xtz_pool))?;
    println!("{} {}", "xtz volume:".bright_cyan(), volume);
    Ok(())
}

pub fn token_to_token(input: (u128, u128), output: (u128, u128), amount: u128) -> Result<()> {
    let (sell, buy) = quote_token_to_token(input, output, amount)?;
    println!("{}", "=== Quote: token -> token ===".bright_green().bold());
    println!("{} {}", "Tokens sold:".bright_cyan(), amount);
    println!("{} {}", "xtz bridged:".bright_cyan(), sell.bought);
    println!("{} {}", "Tokens bought:".bright_cyan(), buy.bought);
    println!(
        "{} {} + {} = {}",
        "Reserve fees:".bright_cyan(),
        sell.reserve_fee,
        buy.reserve_fee,
        sell.reserve_fee + buy.reserve_fee
    );
    Ok(())
}

pub fn add_liquidity(xtz_pool: u128, token_pool: u128, lqt_total: u128, amount: u128) -> Result<()> {
    let minted = check(lqt_minted(amount, lqt_total, xtz_pool))?;
    let deposited = check(tokens_deposited(amount, token_pool, xtz_pool))?;
    println!("{}", "=== Quote: add liquidity ===".bright_green().bold());
    println!("{} {}", "xtz deposited:".bright_cyan(), amount);
    println!("{} {}", "Tokens deposited:".bright_cyan(), deposited);
    println!("{} {}", "Liquidity minted:".bright_cyan(), minted);
    Ok(())
}

pub fn remove_liquidity(
    xtz_pool: u128,
    token_pool: u128,
    lqt_total: u128,
    lqt_burned: u128,
) -> Result<()> {
    if lqt_burned >= lqt_total {
        return Err(DexterError::InsufficientLiquidity.into());
    }
    let xtz = check(share_of(lqt_burned, xtz_pool, lqt_total))?;
    let tokens = check(share_of(lqt_burned, token_pool, lqt_total))?;
    println!("{}", "=== Quote: remove liquidity ===".bright_green().bold());
    println!("{} {}", "Liquidity burned:".bright_cyan(), lqt_burned);
    println!("{} {}", "xtz withdrawn:".bright_cyan(), xtz);
    println!("{} {}", "Tokens withdrawn:".bright_cyan(), tokens);
    Ok(())
}

fn print_swap(quote: &SwapQuote, unit: &str) {
    println!("{} {} {}", "Bought:".bright_cyan(), quote.bought, unit);
    println!("{} {}", "Reserve fee:".bright_cyan(), quote.reserve_fee);
    println!(
        "{} {} / {}",
        "Pools after:".bright_cyan(),
        quote.new_input_pool,
        quote.new_output_pool
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: u128 = 10_000_000_000;

    #[test]
    fn test_xtz_to_token_reference() {
        let quote = quote_xtz_to_token(POOL, POOL, 100_000).unwrap();
        assert_eq!(quote.bought, 99_719);
        assert_eq!(quote.reserve_fee, 30);
        assert_eq!(quote.new_input_pool, POOL + 99_970);
    }

    #[test]
    fn test_token_to_xtz_reference() {
        let quote = quote_token_to_xtz(POOL, POOL, 100_000).unwrap();
        assert_eq!(quote.bought, 99_719);
        assert_eq!(quote.reserve_fee, 29);
        assert_eq!(quote.new_output_pool, POOL - 99_748);
    }

    #[test]
    fn test_token_to_token_reference() {
        let (sell, buy) = quote_token_to_token((POOL, POOL), (POOL, POOL), 100_000).unwrap();
        assert_eq!(buy.bought, 99_438);
        assert_eq!(sell.reserve_fee + buy.reserve_fee, 58);
    }

    #[test]
    fn test_empty_pool_rejected() {
        let err = quote_xtz_to_token(0, 0, 100).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DexterError>(),
            Some(&DexterError::InsufficientLiquidity)
        );
    }
}
