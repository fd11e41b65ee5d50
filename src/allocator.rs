// 🎲 Identifier Allocator
//
// Draws random identifiers in [0, MAX_ACCOUNT_ID) and only accepts one the
// store does not already hold. Each draw is a single indexed lookup, so the
// cost does not grow with the number of accounts. The primary key on insert
// stays the final authority; the coordinator retries on Conflict.

use rand::Rng;
use rusqlite::Connection;
use tracing::debug;

use crate::db;
use crate::entities::{AccountId, MAX_ACCOUNT_ID};
use crate::error::Result;

/// How many allocate-then-insert rounds `create_account` tries before giving
/// up with `Conflict`.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 8;

/// Draw candidates until `in_use` reports one as free.
///
/// The id space is ~2^31 wide and ledgers are tiny by comparison, so the
/// loop terminates after a handful of draws in practice.
pub fn pick_unused<R, F>(rng: &mut R, mut in_use: F) -> Result<AccountId>
where
    R: Rng + ?Sized,
    F: FnMut(AccountId) -> Result<bool>,
{
    loop {
        let candidate = rng.gen_range(0..MAX_ACCOUNT_ID);
        if !in_use(candidate)? {
            return Ok(candidate);
        }
        debug!(candidate, "candidate id already in use, drawing again");
    }
}

/// Return an id no account row holds, checked through `conn`.
///
/// Call this inside the same transaction that will insert the account so the
/// answer cannot change underneath.
pub fn allocate<R: Rng + ?Sized>(conn: &Connection, rng: &mut R) -> Result<AccountId> {
    pick_unused(rng, |candidate| db::exists(conn, candidate))
}
