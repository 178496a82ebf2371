//! Shared ledger setup for the integration suites

#![allow(dead_code)]

use dexter_exchange::*;

pub const NOW: i64 = 1_630_000_000;
pub const DEADLINE: i64 = 1_946_000_000;

pub fn addr(s: &str) -> Address {
    Address::from(s)
}

pub fn alice() -> Address {
    addr("tz1alice")
}

pub fn bob() -> Address {
    addr("tz1bob")
}

pub fn reserve() -> Address {
    addr("tz1reserve")
}

pub fn ledger() -> Sandbox {
    let mut ledger = Sandbox::new(addr("KT1factory"), reserve(), NOW);
    ledger.fund(&alice(), 1_000_000_000_000_000).unwrap();
    ledger.fund(&bob(), 1_000_000_000_000_000).unwrap();
    ledger
}

/// Originate an FA1.2 token, mint to alice and launch its exchange
///
/// Alice keeps a large unrestricted allowance for the exchange so trades
/// can pull tokens.
pub fn launch_fa12(ledger: &mut Sandbox, name: &str, xtz_pool: u128, token_pool: u128) -> (Address, TokenRef) {
    let token = TokenRef::single(name);
    ledger.originate_fa12(token.address.clone());
    ledger.mint_tokens(&token, &alice(), token_pool * 1_000).unwrap();
    let factory = ledger.factory().address().clone();
    ledger.authorize(&token, &alice(), &factory, token_pool).unwrap();
    let exchange = ledger
        .launch_exchange(&alice(), token.clone(), token_pool, xtz_pool)
        .unwrap();
    ledger
        .authorize(&token, &alice(), &exchange, u128::MAX)
        .unwrap();
    (exchange, token)
}

pub fn launch_fa2(ledger: &mut Sandbox, name: &str, token_id: u64, xtz_pool: u128, token_pool: u128) -> (Address, TokenRef) {
    let token = TokenRef::new(name, token_id);
    ledger.originate_fa2(token.address.clone());
    ledger.mint_tokens(&token, &alice(), token_pool * 1_000).unwrap();
    let factory = ledger.factory().address().clone();
    ledger.authorize(&token, &alice(), &factory, 1).unwrap();
    let exchange = ledger
        .launch_exchange(&alice(), token.clone(), token_pool, xtz_pool)
        .unwrap();
    ledger.authorize(&token, &alice(), &exchange, 1).unwrap();
    (exchange, token)
}

/// Pools match what the ledger actually holds for the exchange
pub fn assert_conserved(ledger: &Sandbox, exchange: &Address) {
    let ex = ledger.exchange(exchange).unwrap();
    assert_eq!(ledger.balance(exchange), ex.xtz_pool(), "xtz pool != native balance");
    assert_eq!(
        ledger.token_balance(ex.token(), exchange),
        ex.token_pool(),
        "token pool != token balance"
    );
    assert_eq!(ledger.lqt_supply(exchange), ex.lqt_total(), "lqt supply != lqt_total");
}

pub fn xtz_to_token(to: &Address, min_tokens_bought: u128) -> ExchangeInstruction {
    ExchangeInstruction::XtzToToken(XtzToToken {
        to: to.clone(),
        min_tokens_bought,
        deadline: DEADLINE,
    })
}

pub fn token_to_xtz(to: &Address, tokens_sold: u128, min_xtz_bought: u128) -> ExchangeInstruction {
    ExchangeInstruction::TokenToXtz(TokenToXtz {
        to: to.clone(),
        tokens_sold,
        min_xtz_bought,
        deadline: DEADLINE,
    })
}
