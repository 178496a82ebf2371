//! Dex Model - Pure constant product math for the Dexter exchange
//!
//! Every pricing and fee formula used by `programs/exchange` lives here as a
//! plain function over `u128` amounts. Nothing in this crate touches state,
//! so the exchange can quote a trade (plan) before it commits anything.
//!
//! All divisions floor unless the function name says otherwise.

#![no_std]

pub mod math;

pub use math::{
    ceil_div, lqt_minted, reserve_fee, reserve_fee_native_in, share_of, swap_output,
    tokens_deposited, xtz_volume,
};

/// Fee denominator (10,000 = 100%)
pub const FEE_DENOMINATOR: u128 = 10_000;

/// Fraction of the input that reaches the curve (99.72%)
///
/// The remaining 0.28% splits into 0.25% for liquidity providers (stays in
/// the pool) and 0.03% for the reserve.
pub const FEE_NUMERATOR: u128 = 9_972;

/// Reserve share of the input, in units of `FEE_DENOMINATOR` (0.03%)
pub const RESERVE_FEE_NUMERATOR: u128 = 3;

/// Error types for pool math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexMathError {
    /// Output would drain the pool, or the pool is empty
    InsufficientLiquidity,
    /// Arithmetic overflow
    Overflow,
}
