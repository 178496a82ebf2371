//! Per-exchange telemetry: last pool snapshot, last swap volume, and each
//! account's most recent liquidity movement.

use crate::types::Address;
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot taken after every successful state-changing call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub xtz_pool: u128,
    pub token_pool: u128,
    /// Native volume of the most recent swap
    pub xtz_volume: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Add,
    Remove,
}

/// Most recent liquidity movement of one account (overwritten, not appended)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserInvestment {
    pub direction: Direction,
    pub xtz: u128,
    pub token: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryTracker {
    record: HistoryRecord,
    investments: BTreeMap<Address, UserInvestment>,
}

impl HistoryTracker {
    /// Start tracking from the launch pools, with no volume yet
    pub fn new(xtz_pool: u128, token_pool: u128) -> Self {
        Self {
            record: HistoryRecord {
                xtz_pool,
                token_pool,
                xtz_volume: 0,
            },
            investments: BTreeMap::new(),
        }
    }

    pub fn record(&self) -> HistoryRecord {
        self.record
    }

    pub fn user_investment(&self, account: &Address) -> Option<UserInvestment> {
        self.investments.get(account).copied()
    }

    pub fn investments(&self) -> impl Iterator<Item = (&Address, &UserInvestment)> {
        self.investments.iter()
    }

    pub(crate) fn record_swap(&mut self, xtz_pool: u128, token_pool: u128, xtz_volume: u128) {
        self.record = HistoryRecord {
            xtz_pool,
            token_pool,
            xtz_volume,
        };
    }

    /// Pool change without a trade (liquidity moves, deposits, refreshes)
    ///
    /// `xtz_volume` keeps the last swap's value instead of dropping to 0,
    /// so dashboards still show the most recent trade.
    pub(crate) fn record_pools(&mut self, xtz_pool: u128, token_pool: u128) {
        self.record.xtz_pool = xtz_pool;
        self.record.token_pool = token_pool;
    }

    pub(crate) fn record_investment(
        &mut self,
        account: &Address,
        direction: Direction,
        xtz: u128,
        token: u128,
    ) {
        self.investments.insert(
            account.clone(),
            UserInvestment {
                direction,
                xtz,
                token,
            },
        );
    }
}
