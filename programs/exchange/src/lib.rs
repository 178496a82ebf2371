//! Dexter exchange - constant product market maker with a fee reserve
//!
//! One [`Exchange`] holds a native (xtz) pool and a token pool. Trades pay a
//! 0.28% fee: 0.25% stays with liquidity providers, 0.03% goes to the
//! exchange's reserve. Every entry point returns the [`Operation`]s the
//! hosting ledger must execute; the engine itself never moves funds.
//!
//! Layout:
//! - `state` - exchange storage, liquidity ledger, history tracker
//! - `instructions` - one handler per entry point, each split into a
//!   read-only plan and an infallible apply
//! - `factory` - launches exchanges and keeps the token registry
//! - `token` - FA1.2 / FA2 token contracts behind one trait
//! - `sandbox` - in-memory ledger that executes operations atomically

pub mod entrypoint;
pub mod error;
pub mod factory;
pub mod instructions;
pub mod operation;
pub mod sandbox;
pub mod state;
pub mod token;
pub mod types;

pub use entrypoint::process_instruction;
pub use error::{DexterError, Result, Role, Slippage};
pub use factory::{ExchangeFactory, Launch};
pub use instructions::{
    AddLiquidity, ExchangeInstruction, RemoveLiquidity, SetBaker, TokenToToken, TokenToXtz,
    XtzToToken,
};
pub use operation::Operation;
pub use sandbox::Sandbox;
pub use state::{Direction, Exchange, ExchangeInit, HistoryRecord, HistoryTracker, UserInvestment};
pub use token::{Fa12Token, Fa2Token, TokenContract, TokenError, TokenStandard};
pub use types::{Address, Context, TokenRef};
