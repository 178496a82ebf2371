//! Scenario runner
//!
//! Builds a fresh [`Sandbox`] from the scenario, replays every step and
//! checks each outcome against the step's `expect_code`.

use crate::config::{parse_time, Action, Scenario, DEFAULT_DEADLINE_SECS};
use anyhow::{anyhow, bail, Context as _, Result};
use colored::Colorize;
use dexter_exchange::{
    AddLiquidity, Address, DexterError, Exchange, ExchangeInstruction, RemoveLiquidity, Sandbox,
    SetBaker, TokenRef, TokenStandard, TokenToToken, TokenToXtz, XtzToToken,
};
use std::collections::BTreeMap;

/// Outcome of one engine call: a description on success, the engine error otherwise
type Outcome = std::result::Result<String, DexterError>;

pub struct Runner {
    ledger: Sandbox,
    tokens: BTreeMap<String, TokenRef>,
}

impl Runner {
    /// Set up accounts, tokens and launched exchanges
    pub fn build(scenario: &Scenario) -> Result<Self> {
        let mut ledger = Sandbox::new(
            Address::from(scenario.factory.as_str()),
            Address::from(scenario.default_reserve.as_str()),
            scenario.start_time()?,
        );

        for account in &scenario.accounts {
            ledger
                .fund(&Address::from(account.address.as_str()), account.xtz)
                .with_context(|| format!("Failed to fund {}", account.address))?;
        }

        let mut tokens = BTreeMap::new();
        for config in &scenario.tokens {
            let address = Address::from(config.name.as_str());
            let token = match config.standard {
                TokenStandard::Fa12 => {
                    ledger.originate_fa12(address.clone());
                    TokenRef::single(address)
                }
                TokenStandard::Fa2 => {
                    ledger.originate_fa2(address.clone());
                    TokenRef::new(address, config.token_id)
                }
            };
            for holding in &config.balances {
                ledger
                    .mint_tokens(&token, &Address::from(holding.owner.as_str()), holding.amount)
                    .with_context(|| format!("Failed to mint {} to {}", config.name, holding.owner))?;
            }
            tokens.insert(config.name.clone(), token);
        }

        let mut runner = Self { ledger, tokens };
        for config in &scenario.exchanges {
            let token = runner.token(&config.token)?.clone();
            let launcher = runner.account(&config.launcher)?;
            let factory = runner.ledger.factory().address().clone();

            runner.ledger.authorize(&token, &launcher, &factory, 0)?;
            runner
                .ledger
                .authorize(&token, &launcher, &factory, config.token_amount)?;
            let exchange = runner
                .ledger
                .launch_exchange(&launcher, token, config.token_amount, config.xtz)
                .with_context(|| format!("Failed to launch exchange for {}", config.token))?;
            log::info!("Launched {} for {}", exchange, config.token);
        }

        Ok(runner)
    }

    pub fn ledger(&self) -> &Sandbox {
        &self.ledger
    }

    fn token(&self, name: &str) -> Result<&TokenRef> {
        self.tokens
            .get(name)
            .ok_or_else(|| anyhow!("Unknown token: {}", name))
    }

    /// Token name or exchange address to exchange address
    fn exchange(&self, name: &str) -> Result<Address> {
        match self.tokens.get(name) {
            Some(token) => self
                .ledger
                .factory()
                .exchange_for(token)
                .cloned()
                .ok_or_else(|| anyhow!("No exchange launched for {}", name)),
            None => Ok(Address::from(name)),
        }
    }

    /// `@token` names that token's exchange, anything else is an address
    fn account(&self, name: &str) -> Result<Address> {
        match name.strip_prefix('@') {
            Some(token) => self.exchange(token),
            None => Ok(Address::from(name)),
        }
    }

    fn recipient(&self, to: &Option<String>, sender: &Address) -> Result<Address> {
        match to {
            Some(name) => self.account(name),
            None => Ok(sender.clone()),
        }
    }

    fn deadline(&self, deadline: &Option<String>) -> Result<i64> {
        match deadline {
            Some(s) => parse_time(s),
            None => Ok(self.ledger.now() + DEFAULT_DEADLINE_SECS),
        }
    }

    fn call(
        &mut self,
        exchange: &Address,
        sender: &Address,
        amount: u128,
        instruction: ExchangeInstruction,
    ) -> Outcome {
        let name = instruction.name();
        let ops = self.ledger.call(exchange, sender, amount, &instruction)?;
        Ok(format!("{} on {} ({} operations)", name, exchange, ops.len()))
    }

    /// Run one action; the outer error is a scenario mistake, the inner one
    /// an engine rejection
    pub fn execute(&mut self, action: &Action) -> Result<Outcome> {
        let outcome = match action {
            Action::Authorize { token, owner, spender, amount } => {
                let token_ref = self.token(token)?.clone();
                let owner = self.account(owner)?;
                let spender = self.account(spender)?;
                self.ledger
                    .authorize(&token_ref, &owner, &spender, *amount)
                    .map(|()| format!("{} authorized {} for {} {}", owner, spender, amount, token))
            }
            Action::XtzToToken { exchange, sender, to, amount, min_tokens_bought, deadline } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                let instruction = ExchangeInstruction::XtzToToken(XtzToToken {
                    to: self.recipient(to, &sender)?,
                    min_tokens_bought: *min_tokens_bought,
                    deadline: self.deadline(deadline)?,
                });
                self.call(&exchange, &sender, *amount, instruction)
            }
            Action::TokenToXtz { exchange, sender, to, tokens_sold, min_xtz_bought, deadline } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                let instruction = ExchangeInstruction::TokenToXtz(TokenToXtz {
                    to: self.recipient(to, &sender)?,
                    tokens_sold: *tokens_sold,
                    min_xtz_bought: *min_xtz_bought,
                    deadline: self.deadline(deadline)?,
                });
                self.call(&exchange, &sender, 0, instruction)
            }
            Action::TokenToToken {
                exchange,
                output,
                sender,
                to,
                tokens_sold,
                min_tokens_bought,
                deadline,
            } => {
                let input = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                let params = TokenToToken {
                    output_exchange: self.exchange(output)?,
                    to: self.recipient(to, &sender)?,
                    tokens_sold: *tokens_sold,
                    min_tokens_bought: *min_tokens_bought,
                    deadline: self.deadline(deadline)?,
                };
                self.ledger
                    .token_to_token(&input, &sender, 0, &params)
                    .map(|ops| {
                        format!(
                            "TokenToToken {} -> {} ({} operations)",
                            input,
                            params.output_exchange,
                            ops.len()
                        )
                    })
            }
            Action::AddLiquidity {
                exchange,
                sender,
                owner,
                amount,
                min_lqt_minted,
                max_tokens_deposited,
                deadline,
            } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                let instruction = ExchangeInstruction::AddLiquidity(AddLiquidity {
                    owner: self.recipient(owner, &sender)?,
                    min_lqt_minted: *min_lqt_minted,
                    max_tokens_deposited: *max_tokens_deposited,
                    deadline: self.deadline(deadline)?,
                });
                self.call(&exchange, &sender, *amount, instruction)
            }
            Action::RemoveLiquidity {
                exchange,
                sender,
                to,
                lqt_burned,
                min_xtz_withdrawn,
                min_tokens_withdrawn,
                deadline,
            } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                let instruction = ExchangeInstruction::RemoveLiquidity(RemoveLiquidity {
                    to: self.recipient(to, &sender)?,
                    lqt_burned: *lqt_burned,
                    min_xtz_withdrawn: *min_xtz_withdrawn,
                    min_tokens_withdrawn: *min_tokens_withdrawn,
                    deadline: self.deadline(deadline)?,
                });
                self.call(&exchange, &sender, 0, instruction)
            }
            Action::UpdateReserve { exchange, sender, new_reserve } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                let instruction = ExchangeInstruction::UpdateReserve(self.account(new_reserve)?);
                self.call(&exchange, &sender, 0, instruction)
            }
            Action::SetBaker { exchange, sender, baker, freeze } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                let instruction = ExchangeInstruction::SetBaker(SetBaker {
                    baker: baker.as_deref().map(Address::from),
                    freeze_baker: *freeze,
                });
                self.call(&exchange, &sender, 0, instruction)
            }
            Action::Default { exchange, sender, amount } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                self.call(&exchange, &sender, *amount, ExchangeInstruction::Default)
            }
            Action::UpdateTokenPool { exchange, sender } => {
                let exchange = self.exchange(exchange)?;
                let sender = self.account(sender)?;
                self.call(&exchange, &sender, 0, ExchangeInstruction::UpdateTokenPool)
            }
            Action::SettleCallbacks => self
                .ledger
                .settle_callbacks()
                .map(|settled| format!("Settled {} balance callbacks", settled)),
            Action::Advance { seconds } => {
                self.ledger.advance(*seconds);
                Ok(format!("Advanced clock {}s to {}", seconds, self.ledger.now()))
            }
        };
        Ok(outcome)
    }
}

/// Run a scenario and print the results
pub fn run(scenario: &Scenario, json: bool) -> Result<()> {
    let title = format!("=== {} ===", scenario.name.as_deref().unwrap_or("Scenario"));
    println!("{}", title.bright_green().bold());

    let mut runner = Runner::build(scenario)?;
    println!(
        "{} {} exchanges, {} tokens",
        "Ledger:".bright_cyan(),
        runner.ledger().factory().counter(),
        scenario.tokens.len()
    );

    let mut passed = 0;
    let mut failed = 0;

    for (index, step) in scenario.steps.iter().enumerate() {
        let label = format!("[{}]", index + 1);
        let outcome = runner
            .execute(&step.action)
            .with_context(|| format!("Step {} is malformed", index + 1))?;

        match (outcome, step.expect_code) {
            (Ok(description), None) => {
                println!("{} {} {}", "✓".bright_green(), label, description);
                passed += 1;
            }
            (Ok(description), Some(code)) => {
                println!(
                    "{} {} {}: expected failure code {}",
                    "✗".bright_red(),
                    label,
                    description,
                    code
                );
                failed += 1;
            }
            (Err(e), Some(code)) if e.code() == Some(code) => {
                println!("{} {} rejected as expected: {}", "✓".bright_green(), label, e);
                passed += 1;
            }
            (Err(e), _) => {
                println!("{} {} {}", "✗".bright_red(), label, e);
                failed += 1;
            }
        }
    }

    println!();
    print_summary(runner.ledger());

    if json {
        let exchanges: Vec<&Exchange> = runner.ledger().exchanges().collect();
        println!("{}", serde_json::to_string_pretty(&exchanges)?);
    }

    println!(
        "\n{} {} passed, {} failed",
        "Steps:".bright_cyan(),
        passed.to_string().bright_green(),
        failed.to_string().bright_red()
    );

    if failed > 0 {
        bail!("{} step(s) did not match their expected outcome", failed);
    }
    Ok(())
}

fn print_summary(ledger: &Sandbox) {
    println!("{}", "=== Final State ===".bright_green().bold());
    for exchange in ledger.exchanges() {
        let history = exchange.history();
        println!("{} {}", "Exchange:".bright_cyan(), exchange.address());
        println!("  {} {}", "Token:".bright_cyan(), exchange.token());
        println!(
            "  {} xtz={} token={}",
            "Pools:".bright_cyan(),
            exchange.xtz_pool(),
            exchange.token_pool()
        );
        println!("  {} {}", "Liquidity:".bright_cyan(), exchange.lqt_total());
        println!(
            "  {} {} (balance {})",
            "Reserve:".bright_cyan(),
            exchange.reserve(),
            ledger.balance(exchange.reserve())
        );
        println!("  {} {}", "xtz volume:".bright_cyan(), history.xtz_volume);
        if let Some(baker) = exchange.baker() {
            let frozen = if exchange.is_baker_frozen() { " (frozen)" } else { "" };
            println!("  {} {}{}", "Baker:".bright_cyan(), baker, frozen);
        }
    }
    if ledger.pending_callbacks() > 0 {
        println!(
            "{} {}",
            "Pending callbacks:".bright_yellow(),
            ledger.pending_callbacks()
        );
    }
}
