//! Privileged entry points: reserve hand-over and delegation

use super::SetBaker;
use crate::error::{DexterError, Result, Role};
use crate::operation::Operation;
use crate::state::{ensure_no_amount, Exchange};
use crate::types::{Address, Context};

/// Process update_reserve
///
/// Only the current reserve may name its successor. No other role
/// (manager or factory included) can change it.
pub fn process_update_reserve(
    exchange: &mut Exchange,
    ctx: &Context,
    new_reserve: &Address,
) -> Result<Vec<Operation>> {
    exchange.ensure_not_updating()?;
    ensure_no_amount(ctx)?;

    if ctx.sender != exchange.reserve {
        log::warn!(
            "update_reserve: {} is not the reserve of {}",
            ctx.sender,
            exchange.address
        );
        return Err(DexterError::NotAuthorized(Role::Reserve));
    }
    exchange.ensure_external(new_reserve)?;

    log::info!("Reserve of {}: {} -> {}", exchange.address, exchange.reserve, new_reserve);
    exchange.reserve = new_reserve.clone();
    Ok(Vec::new())
}

/// Process set_baker
///
/// Manager only. Once a baker is set with `freeze_baker`, delegation can
/// never change again.
pub fn process_set_baker(
    exchange: &mut Exchange,
    ctx: &Context,
    params: &SetBaker,
) -> Result<Vec<Operation>> {
    exchange.ensure_not_updating()?;
    ensure_no_amount(ctx)?;

    if ctx.sender != exchange.manager {
        return Err(DexterError::NotAuthorized(Role::Manager));
    }
    if exchange.frozen {
        return Err(DexterError::BakerFrozen);
    }

    exchange.baker = params.baker.clone();
    exchange.frozen = params.freeze_baker;

    Ok(vec![Operation::SetDelegate {
        exchange: exchange.address.clone(),
        baker: params.baker.clone(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;

    #[test]
    fn test_reserve_hand_over() {
        let mut ex = exchange();

        // Manager cannot move the reserve
        let err = process_update_reserve(&mut ex, &ctx("factory", 0), &addr("thief")).unwrap_err();
        assert_eq!(err, DexterError::NotAuthorized(Role::Reserve));
        assert_eq!(err.code(), Some(40));
        assert_eq!(ex.reserve(), &addr("reserve"));

        process_update_reserve(&mut ex, &ctx("reserve", 0), &addr("reserve-2")).unwrap();
        assert_eq!(ex.reserve(), &addr("reserve-2"));

        // The old reserve has lost the role
        assert!(process_update_reserve(&mut ex, &ctx("reserve", 0), &addr("reserve")).is_err());
    }

    #[test]
    fn test_reserve_cannot_be_the_exchange() {
        let mut ex = exchange();
        let err = process_update_reserve(&mut ex, &ctx("reserve", 0), &addr("dex")).unwrap_err();
        assert_eq!(err, DexterError::SelfRecipient);
        assert_eq!(ex.reserve(), &addr("reserve"));
    }

    #[test]
    fn test_set_baker_freezes() {
        let mut ex = exchange();
        let baker = SetBaker {
            baker: Some(addr("baker")),
            freeze_baker: true,
        };

        assert_eq!(
            process_set_baker(&mut ex, &ctx("alice", 0), &baker),
            Err(DexterError::NotAuthorized(Role::Manager))
        );

        let ops = process_set_baker(&mut ex, &ctx("factory", 0), &baker).unwrap();
        assert_eq!(
            ops,
            vec![Operation::SetDelegate {
                exchange: addr("dex"),
                baker: Some(addr("baker")),
            }]
        );
        assert_eq!(ex.baker(), Some(&addr("baker")));
        assert!(ex.is_baker_frozen());

        assert_eq!(
            process_set_baker(&mut ex, &ctx("factory", 0), &SetBaker { baker: None, freeze_baker: false }),
            Err(DexterError::BakerFrozen)
        );
    }
}
