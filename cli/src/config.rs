//! Scenario files
//!
//! A scenario describes a ledger (accounts, tokens, exchanges) and an
//! ordered list of steps to run against it. Names used in steps resolve as:
//! - a token name -> that token's exchange (for `exchange` / `output`)
//! - `@name` -> the exchange of token `name` (for any account field)
//! - anything else -> a plain account address

use anyhow::{Context, Result};
use dexter_exchange::TokenStandard;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default deadline slack when a step does not set one (seconds)
pub const DEFAULT_DEADLINE_SECS: i64 = 3_600;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Ledger start time (RFC 3339)
    pub start: String,
    #[serde(default = "default_factory")]
    pub factory: String,
    pub default_reserve: String,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_factory() -> String {
    "KT1DexterFactory".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub address: String,
    /// Initial native balance (mutez)
    pub xtz: u128,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// Name used in steps; also the contract address
    pub name: String,
    pub standard: TokenStandard,
    #[serde(default)]
    pub token_id: u64,
    #[serde(default)]
    pub balances: Vec<Holding>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Holding {
    pub owner: String,
    pub amount: u128,
}

/// Launched through the factory; the launcher's authorization of the
/// factory is granted automatically
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeConfig {
    pub token: String,
    pub launcher: String,
    pub token_amount: u128,
    pub xtz: u128,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Failure code the step must fail with
    #[serde(default)]
    pub expect_code: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Authorize {
        token: String,
        owner: String,
        spender: String,
        amount: u128,
    },
    XtzToToken {
        exchange: String,
        sender: String,
        #[serde(default)]
        to: Option<String>,
        amount: u128,
        #[serde(default)]
        min_tokens_bought: u128,
        #[serde(default)]
        deadline: Option<String>,
    },
    TokenToXtz {
        exchange: String,
        sender: String,
        #[serde(default)]
        to: Option<String>,
        tokens_sold: u128,
        #[serde(default)]
        min_xtz_bought: u128,
        #[serde(default)]
        deadline: Option<String>,
    },
    TokenToToken {
        exchange: String,
        output: String,
        sender: String,
        #[serde(default)]
        to: Option<String>,
        tokens_sold: u128,
        #[serde(default)]
        min_tokens_bought: u128,
        #[serde(default)]
        deadline: Option<String>,
    },
    AddLiquidity {
        exchange: String,
        sender: String,
        #[serde(default)]
        owner: Option<String>,
        amount: u128,
        #[serde(default)]
        min_lqt_minted: u128,
        #[serde(default = "unbounded")]
        max_tokens_deposited: u128,
        #[serde(default)]
        deadline: Option<String>,
    },
    RemoveLiquidity {
        exchange: String,
        sender: String,
        #[serde(default)]
        to: Option<String>,
        lqt_burned: u128,
        #[serde(default)]
        min_xtz_withdrawn: u128,
        #[serde(default)]
        min_tokens_withdrawn: u128,
        #[serde(default)]
        deadline: Option<String>,
    },
    UpdateReserve {
        exchange: String,
        sender: String,
        new_reserve: String,
    },
    SetBaker {
        exchange: String,
        sender: String,
        #[serde(default)]
        baker: Option<String>,
        #[serde(default)]
        freeze: bool,
    },
    Default {
        exchange: String,
        sender: String,
        amount: u128,
    },
    UpdateTokenPool {
        exchange: String,
        sender: String,
    },
    SettleCallbacks,
    Advance {
        seconds: i64,
    },
}

fn unbounded() -> u128 {
    u128::MAX
}

impl Scenario {
    /// Load a scenario, expanding `~` in the path
    pub fn load(path: &Path) -> Result<Self> {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        let data = fs::read_to_string(&expanded)
            .with_context(|| format!("Failed to read scenario file: {}", expanded.display()))?;
        Self::parse(&data)
            .with_context(|| format!("Failed to parse scenario file: {}", expanded.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(data)?;
        scenario.start_time()?;
        Ok(scenario)
    }

    pub fn start_time(&self) -> Result<i64> {
        parse_time(&self.start)
    }
}

/// RFC 3339 timestamp to unix seconds
pub fn parse_time(s: &str) -> Result<i64> {
    let parsed = chrono::DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", s))?;
    Ok(parsed.timestamp())
}
