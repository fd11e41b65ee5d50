// Entity Models
//
// One logical entity stored in two tables:
// - Account: identifier + balance (account table)
// - Customer: profile fields (customer table)
// They are created and deleted together, so `Account` owns its `Customer`.

pub mod account;
pub mod customer;

pub use account::{Account, AccountId, MAX_ACCOUNT_ID};
pub use customer::Customer;
