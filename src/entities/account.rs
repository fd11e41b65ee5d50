// 💳 Account - balance-bearing aggregate
//
// Identity: integer id, unique across live accounts
// Values: balance (deposit/withdraw/transfer) and customer (update)

use serde::{Deserialize, Serialize};

use super::customer::Customer;

/// Account identifier. Valid ids are in `[0, MAX_ACCOUNT_ID)`.
pub type AccountId = i64;

/// Exclusive upper bound for allocated identifiers.
pub const MAX_ACCOUNT_ID: AccountId = 2_147_483_647;

/// Account aggregate: the account row plus its customer row.
///
/// Serializes flat, e.g.
/// `{"name":"John","address":"LA","phone":"555","id":1001,"balance":100.0}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(flatten)]
    pub customer: Customer,

    pub id: AccountId,

    pub balance: f64,
}

impl Account {
    /// Fresh account: balances always start at zero.
    pub fn open(id: AccountId, customer: Customer) -> Self {
        Account {
            customer,
            id,
            balance: 0.0,
        }
    }

    /// A committed balance is never negative; seeing one means a prior
    /// invariant violation.
    pub fn is_corrupt(&self) -> bool {
        self.balance < 0.0
    }

    /// One-line statement: `"<id> - <name> - <balance>"`
    pub fn statement(&self) -> String {
        format!("{} - {} - {}", self.id, self.customer.name, self.balance)
    }
}
