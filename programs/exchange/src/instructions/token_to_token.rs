//! Token -> token routing through two exchanges
//!
//! Leg 1 sells tokens for xtz on the input exchange; leg 2 spends that xtz
//! on the output exchange. Both legs are planned against untouched state
//! before either is applied, so a failure in leg 2 leaves leg 1 unapplied.

use super::swap::{apply_token_to_xtz, apply_xtz_to_token, plan_token_to_xtz, plan_xtz_to_token};
use super::{TokenToToken, TokenToXtz, XtzToToken};
use crate::error::{DexterError, Result};
use crate::operation::Operation;
use crate::state::{ensure_no_amount, Exchange};
use crate::types::Context;

/// Process token_to_token
///
/// The caller sells `tokens_sold` of `input`'s token; `output`'s token goes
/// to `params.to`. Each exchange pays its own reserve fee and records its
/// own history.
///
/// # Arguments
/// * `input` - Exchange whose token is sold
/// * `output` - Exchange whose token is bought (must be `params.output_exchange`)
/// * `ctx` - Call context of the outer caller
/// * `params` - Output exchange, recipient, amounts and deadline
pub fn process_token_to_token(
    input: &mut Exchange,
    output: &mut Exchange,
    ctx: &Context,
    params: &TokenToToken,
) -> Result<Vec<Operation>> {
    if output.address != params.output_exchange || input.address == output.address {
        log::warn!("token_to_token: invalid output exchange {}", params.output_exchange);
        return Err(DexterError::InvalidIntermediate);
    }
    ensure_no_amount(ctx)?;

    // Step 1: leg 1 on the input exchange, proceeds go to the output exchange
    let sell = TokenToXtz {
        to: output.address.clone(),
        tokens_sold: params.tokens_sold,
        min_xtz_bought: 0,
        deadline: params.deadline,
    };
    let leg1 = plan_token_to_xtz(input, ctx, &sell)?;

    // Step 2: leg 2 as an internal call from the input exchange
    let leg2_ctx = Context::internal(
        input.address.clone(),
        ctx.source.clone(),
        leg1.xtz_bought,
        ctx.now,
    );
    let buy = XtzToToken {
        to: params.to.clone(),
        min_tokens_bought: params.min_tokens_bought,
        deadline: params.deadline,
    };
    let leg2 = plan_xtz_to_token(output, &leg2_ctx, &buy)?;

    log::debug!(
        "token_to_token: tokens_sold={} xtz_bridged={} tokens_bought={} reserve_fees={}+{}",
        leg1.tokens_sold,
        leg1.xtz_bought,
        leg2.tokens_bought,
        leg1.reserve_fee,
        leg2.reserve_fee
    );

    // Step 3: commit both legs
    let mut ops = apply_token_to_xtz(input, ctx, &sell.to, &leg1);
    ops.extend(apply_xtz_to_token(output, &buy.to, &leg2));
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Slippage;
    use crate::state::test_support::*;

    fn route(output: &str, min_tokens_bought: u128) -> TokenToToken {
        TokenToToken {
            output_exchange: addr(output),
            to: addr("bob"),
            tokens_sold: 100_000,
            min_tokens_bought,
            deadline: DEADLINE,
        }
    }

    fn reserve_total(ops: &[Operation]) -> u128 {
        ops.iter()
            .filter_map(|op| match op {
                Operation::Send { to, amount, .. } if to.as_str() == "reserve" => Some(*amount),
                _ => None,
            })
            .sum()
    }

    #[test]
    fn test_two_leg_reference() {
        let mut a = exchange_with("dex-a", POOL, POOL);
        let mut b = exchange_with("dex-b", POOL, POOL);

        let ops = process_token_to_token(&mut a, &mut b, &ctx("alice", 0), &route("dex-b", 0)).unwrap();

        assert_eq!(reserve_total(&ops), 58);
        assert_eq!(b.token_pool(), POOL - 99_438);
        assert_eq!(a.xtz_pool(), POOL - 99_719 - 29);
        assert_eq!(b.xtz_pool(), POOL + 99_719 - 29);
        assert!(ops.contains(&Operation::Send {
            from: addr("dex-a"),
            to: addr("dex-b"),
            amount: 99_719,
        }));
        assert_eq!(b.history().xtz_volume, 99_719);
    }

    #[test]
    fn test_second_leg_failure_applies_nothing() {
        let mut a = exchange_with("dex-a", POOL, POOL);
        let mut b = exchange_with("dex-b", POOL, POOL);
        let (a0, b0) = (a.clone(), b.clone());

        let err = process_token_to_token(&mut a, &mut b, &ctx("alice", 0), &route("dex-b", 99_439))
            .unwrap_err();

        assert_eq!(err, DexterError::SlippageExceeded(Slippage::TokensBought));
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_output_must_match() {
        let mut a = exchange_with("dex-a", POOL, POOL);
        let mut b = exchange_with("dex-b", POOL, POOL);
        let err = process_token_to_token(&mut a, &mut b, &ctx("alice", 0), &route("dex-c", 0))
            .unwrap_err();
        assert_eq!(err, DexterError::InvalidIntermediate);
        assert_eq!(err.code(), Some(31));
    }

    #[test]
    fn test_busy_output_blocks_route() {
        let mut a = exchange_with("dex-a", POOL, POOL);
        let mut b = exchange_with("dex-b", POOL, POOL);
        b.updating_token_pool = true;
        let a0 = a.clone();

        let err = process_token_to_token(&mut a, &mut b, &ctx("alice", 0), &route("dex-b", 0))
            .unwrap_err();
        assert_eq!(err, DexterError::Busy);
        assert_eq!(a, a0);
    }
}
