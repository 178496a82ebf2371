//! Exchange entrypoint

use crate::error::Result;
use crate::instructions::{
    process_add_liquidity, process_default, process_remove_liquidity, process_set_baker,
    process_token_to_xtz, process_update_reserve, process_update_token_pool,
    process_update_token_pool_internal, process_xtz_to_token, ExchangeInstruction,
};
use crate::operation::Operation;
use crate::state::Exchange;
use crate::types::Context;

pub use crate::instructions::process_token_to_token;

/// Dispatch a single-exchange instruction
///
/// On error the exchange is unchanged and no operations are returned.
pub fn process_instruction(
    exchange: &mut Exchange,
    ctx: &Context,
    instruction: &ExchangeInstruction,
) -> Result<Vec<Operation>> {
    log::info!("Instruction: {} on {}", instruction.name(), exchange.address());

    let result = match instruction {
        ExchangeInstruction::Default => process_default(exchange, ctx),
        ExchangeInstruction::XtzToToken(params) => process_xtz_to_token(exchange, ctx, params),
        ExchangeInstruction::TokenToXtz(params) => process_token_to_xtz(exchange, ctx, params),
        ExchangeInstruction::AddLiquidity(params) => process_add_liquidity(exchange, ctx, params),
        ExchangeInstruction::RemoveLiquidity(params) => {
            process_remove_liquidity(exchange, ctx, params)
        }
        ExchangeInstruction::UpdateReserve(new_reserve) => {
            process_update_reserve(exchange, ctx, new_reserve)
        }
        ExchangeInstruction::SetBaker(params) => process_set_baker(exchange, ctx, params),
        ExchangeInstruction::UpdateTokenPool => process_update_token_pool(exchange, ctx),
        ExchangeInstruction::UpdateTokenPoolInternal(balance) => {
            process_update_token_pool_internal(exchange, ctx, *balance)
        }
    };

    if let Err(e) = &result {
        log::warn!("{} rejected: {}", instruction.name(), e);
    }
    result
}
