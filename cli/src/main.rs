//! Dexter CLI - scenario runner and pricing calculator
//!
//! Replays scripted ledger scenarios against an in-memory Dexter deployment
//! and quotes swaps and liquidity moves from raw pool figures.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod config;
mod quote;
mod scenario;

#[derive(Parser)]
#[command(name = "dexter")]
#[command(about = "Dexter CLI - Run exchange scenarios and quote trades", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a TOML scenario against a fresh ledger
    Run {
        /// Scenario file
        scenario: PathBuf,

        /// Dump final exchange state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Quote a trade from pool figures
    Quote {
        #[command(subcommand)]
        command: QuoteCommands,
    },
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// Sell xtz for tokens
    XtzToToken {
        #[arg(long)]
        xtz_pool: u128,
        #[arg(long)]
        token_pool: u128,
        /// xtz sold (mutez)
        #[arg(long)]
        amount: u128,
    },

    /// Sell tokens for xtz
    TokenToXtz {
        #[arg(long)]
        xtz_pool: u128,
        #[arg(long)]
        token_pool: u128,
        /// Tokens sold
        #[arg(long)]
        amount: u128,
    },

    /// Route tokens through xtz into another exchange's token
    TokenToToken {
        #[arg(long)]
        in_xtz_pool: u128,
        #[arg(long)]
        in_token_pool: u128,
        #[arg(long)]
        out_xtz_pool: u128,
        #[arg(long)]
        out_token_pool: u128,
        /// Input tokens sold
        #[arg(long)]
        amount: u128,
    },

    /// Deposit xtz plus the matching tokens
    AddLiquidity {
        #[arg(long)]
        xtz_pool: u128,
        #[arg(long)]
        token_pool: u128,
        #[arg(long)]
        lqt_total: u128,
        /// xtz deposited (mutez)
        #[arg(long)]
        amount: u128,
    },

    /// Burn liquidity for a share of both pools
    RemoveLiquidity {
        #[arg(long)]
        xtz_pool: u128,
        #[arg(long)]
        token_pool: u128,
        #[arg(long)]
        lqt_total: u128,
        #[arg(long)]
        lqt_burned: u128,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Run { scenario, json } => {
            let loaded = config::Scenario::load(&scenario)?;
            if cli.verbose {
                println!("{} {}", "Scenario:".bright_cyan(), scenario.display());
            }
            scenario::run(&loaded, json)?;
        }
        Commands::Quote { command } => match command {
            QuoteCommands::XtzToToken { xtz_pool, token_pool, amount } => {
                quote::xtz_to_token(xtz_pool, token_pool, amount)?;
            }
            QuoteCommands::TokenToXtz { xtz_pool, token_pool, amount } => {
                quote::token_to_xtz(xtz_pool, token_pool, amount)?;
            }
            QuoteCommands::TokenToToken {
                in_xtz_pool,
                in_token_pool,
                out_xtz_pool,
                out_token_pool,
                amount,
            } => {
                quote::token_to_token(
                    (in_xtz_pool, in_token_pool),
                    (out_xtz_pool, out_token_pool),
                    amount,
                )?;
            }
            QuoteCommands::AddLiquidity { xtz_pool, token_pool, lqt_total, amount } => {
                quote::add_liquidity(xtz_pool, token_pool, lqt_total, amount)?;
            }
            QuoteCommands::RemoveLiquidity { xtz_pool, token_pool, lqt_total, lqt_burned } => {
                quote::remove_liquidity(xtz_pool, token_pool, lqt_total, lqt_burned)?;
            }
        },
    }

    Ok(())
}
