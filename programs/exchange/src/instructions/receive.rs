//! Default entry point: plain native deposits

use crate::error::{DexterError, Result};
use crate::operation::Operation;
use crate::state::Exchange;
use crate::types::Context;

/// Process default
///
/// Native asset sent without an entry point joins the pool. Nobody is
/// credited with liquidity for it.
pub fn process_default(exchange: &mut Exchange, ctx: &Context) -> Result<Vec<Operation>> {
    exchange.ensure_not_updating()?;

    let new_xtz_pool = exchange
        .xtz_pool
        .checked_add(ctx.amount)
        .ok_or(DexterError::Overflow)?;

    exchange.xtz_pool = new_xtz_pool;
    exchange.history.record_pools(new_xtz_pool, exchange.token_pool);
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;

    #[test]
    fn test_default_grows_pool() {
        let mut ex = exchange();
        process_default(&mut ex, &ctx("baker", 500)).unwrap();
        assert_eq!(ex.xtz_pool(), POOL + 500);
        assert_eq!(ex.history().xtz_pool, POOL + 500);
        assert_eq!(ex.lqt_total(), POOL);
    }
}
