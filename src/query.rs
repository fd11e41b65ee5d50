// 🔍 Query Layer - read-only projections
//
// These run outside any transaction and have no side effects. Every call goes
// to the store; nothing is cached.

use tracing::instrument;

use crate::db;
use crate::entities::{Account, AccountId, MAX_ACCOUNT_ID};
use crate::error::Result;
use crate::ledger::Ledger;

/// Lower balance bound used when the caller gives none.
pub const DEFAULT_MIN_BALANCE: f64 = 0.0;

/// Upper balance bound used when the caller gives none.
pub const DEFAULT_MAX_BALANCE: f64 = MAX_ACCOUNT_ID as f64;

impl Ledger {
    #[instrument(skip(self))]
    pub fn get_account(&self, id: AccountId) -> Result<Account> {
        self.read(|conn| db::fetch(conn, id))
    }

    /// Accounts with `min <= balance <= max`, in identifier order. Missing
    /// bounds default to `[0, 2147483647]`.
    #[instrument(skip(self))]
    pub fn get_accounts(&self, min: Option<f64>, max: Option<f64>) -> Result<Vec<Account>> {
        let min = min.unwrap_or(DEFAULT_MIN_BALANCE);
        let max = max.unwrap_or(DEFAULT_MAX_BALANCE);
        self.read(|conn| db::fetch_range(conn, min, max))
    }

    pub fn get_balance(&self, id: AccountId) -> Result<f64> {
        self.get_account(id).map(|account| account.balance)
    }

    /// `"<id> - <name> - <balance>"` for one account.
    pub fn statement(&self, id: AccountId) -> Result<String> {
        self.get_account(id).map(|account| account.statement())
    }
}
