// 🏦 Ledger - connection handle + transactional mutations
//
// Every mutation runs as: BEGIN IMMEDIATE -> read -> validate -> write ->
// COMMIT. IMMEDIATE takes the database write lock before the validating read,
// so two writers can never both pass a balance check against the same
// pre-mutation state. Any `?` inside the closure drops the transaction, which
// rolls it back.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::Rng;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::allocator::{self, MAX_ALLOCATION_ATTEMPTS};
use crate::config::ConnectionConfig;
use crate::db;
use crate::entities::{Account, AccountId, Customer};
use crate::error::{LedgerError, Party, Result};

/// An open ledger. Owns its connection; independent `Ledger` values never
/// share state except through the database file they point at.
pub struct Ledger {
    conn: Mutex<Connection>,
    config: ConnectionConfig,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("database", &self.config.describe())
            .finish()
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        warn!(amount, "rejected non-positive amount");
        return Err(LedgerError::InvalidAmount { amount });
    }
    Ok(())
}

fn ensure_not_corrupt(account: &Account) -> Result<()> {
    if account.is_corrupt() {
        error!(id = account.id, balance = account.balance, "negative balance in store");
        return Err(LedgerError::CorruptState {
            id: account.id,
            balance: account.balance,
        });
    }
    Ok(())
}

fn ensure_covers(account: &Account, amount: f64) -> Result<()> {
    if account.balance - amount < 0.0 {
        return Err(LedgerError::InsufficientFunds {
            id: account.id,
            balance: account.balance,
            amount,
        });
    }
    Ok(())
}

/// Balance after crediting `amount`, refused if it leaves the finite range.
fn credited(account: &Account, amount: f64) -> Result<f64> {
    let balance = account.balance + amount;
    if !balance.is_finite() {
        return Err(LedgerError::BalanceOverflow {
            id: account.id,
            balance: account.balance,
            amount,
        });
    }
    Ok(balance)
}

impl Ledger {
    // ========================================================================
    // CONNECTION LIFECYCLE
    // ========================================================================

    /// Open (and if needed initialize) the ledger described by `config`.
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        let conn = match &config {
            ConnectionConfig::InMemory => {
                Connection::open_in_memory().map_err(LedgerError::Connection)?
            }
            ConnectionConfig::File { path, busy_timeout } => {
                let conn = Connection::open(path).map_err(LedgerError::Connection)?;
                conn.busy_timeout(*busy_timeout)
                    .map_err(LedgerError::Connection)?;
                conn
            }
        };

        let durable = matches!(config, ConnectionConfig::File { .. });
        db::setup_database(&conn, durable)?;

        info!(database = %config.describe(), "ledger opened");

        Ok(Ledger {
            conn: Mutex::new(conn),
            config,
        })
    }

    /// Close the underlying connection, reporting any error from SQLite.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| LedgerError::Store(e))?;
        info!(database = %self.config.describe(), "ledger closed");
        Ok(())
    }

    /// Round-trip a trivial query.
    pub fn ping(&self) -> Result<()> {
        self.read(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    // ========================================================================
    // SCOPES
    // ========================================================================

    // A panic mid-transaction drops the `Transaction`, which rolls back, so the
    // connection behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the connection outside any transaction.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        f(&conn)
    }

    /// Run `f` inside one IMMEDIATE transaction; commit on `Ok`, roll back on
    /// `Err`.
    fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if e.is_business() {
                    warn!(error = %e, "transaction rejected");
                } else {
                    error!(error = %e, "transaction failed");
                }
                // dropping `tx` rolls back
                Err(e)
            }
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Create an account with a fresh identifier and a zero balance.
    pub fn create_account(&self, customer: &Customer) -> Result<Account> {
        self.create_account_with_rng(customer, &mut rand::thread_rng())
    }

    /// `create_account` with an explicit random source for id allocation.
    #[instrument(skip(self, customer, rng), fields(name = %customer.name))]
    pub fn create_account_with_rng<R: Rng + ?Sized>(
        &self,
        customer: &Customer,
        rng: &mut R,
    ) -> Result<Account> {
        let mut last_conflict = None;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let result = self.write(|tx| {
                let id = allocator::allocate(tx, &mut *rng)?;
                db::insert(tx, id, customer)
            });

            match result {
                Ok(account) => {
                    info!(id = account.id, attempt, "account created");
                    return Ok(account);
                }
                Err(LedgerError::Conflict { id }) => {
                    debug!(id, attempt, "allocated id collided, retrying");
                    last_conflict = Some(id);
                }
                Err(e) => return Err(e),
            }
        }

        // the loop runs at least once, so a conflict was recorded
        let id = last_conflict.unwrap_or_default();
        warn!(id, attempts = MAX_ALLOCATION_ATTEMPTS, "id allocation exhausted");
        Err(LedgerError::Conflict { id })
    }

    /// Delete the account and its customer in one transaction.
    #[instrument(skip(self))]
    pub fn delete_account(&self, id: AccountId) -> Result<()> {
        self.write(|tx| {
            db::fetch(tx, id)?;
            db::delete(tx, id)
        })?;

        info!(id, "account deleted");
        Ok(())
    }

    /// Overwrite the customer fields; the balance is untouched.
    #[instrument(skip(self, customer))]
    pub fn update_account(&self, id: AccountId, customer: &Customer) -> Result<Account> {
        let account = self.write(|tx| {
            db::fetch(tx, id)?;
            db::update_customer(tx, id, customer)?;
            db::fetch(tx, id)
        })?;

        info!(id, "account updated");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub fn deposit(&self, id: AccountId, amount: f64) -> Result<Account> {
        validate_amount(amount)?;

        let account = self.write(|tx| {
            let current = db::fetch(tx, id)?;
            ensure_not_corrupt(&current)?;
            let balance = credited(&current, amount)?;

            db::update_balance(tx, id, balance)?;
            db::fetch(tx, id)
        })?;

        info!(id, balance = account.balance, "deposit committed");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub fn withdraw(&self, id: AccountId, amount: f64) -> Result<Account> {
        validate_amount(amount)?;

        let account = self.write(|tx| {
            let current = db::fetch(tx, id)?;
            ensure_not_corrupt(&current)?;
            ensure_covers(&current, amount)?;

            db::update_balance(tx, id, current.balance - amount)?;
            db::fetch(tx, id)
        })?;

        info!(id, balance = account.balance, "withdrawal committed");
        Ok(account)
    }

    /// Move `amount` from `sender` to `receiver`. Both balance writes share one
    /// transaction, so no reader ever sees the money in flight.
    ///
    /// Returns `(sender, receiver)` as committed.
    #[instrument(skip(self))]
    pub fn transfer(
        &self,
        sender: AccountId,
        receiver: AccountId,
        amount: f64,
    ) -> Result<(Account, Account)> {
        validate_amount(amount)?;
        if sender == receiver {
            warn!(id = sender, "rejected transfer to self");
            return Err(LedgerError::SelfTransfer { id: sender });
        }

        let pair = self.write(|tx| {
            let from = db::fetch(tx, sender).map_err(|e| e.for_party(Party::Sender))?;
            ensure_not_corrupt(&from)?;
            ensure_covers(&from, amount)?;

            let to = db::fetch(tx, receiver).map_err(|e| e.for_party(Party::Receiver))?;
            ensure_not_corrupt(&to)?;
            let receiver_balance = credited(&to, amount)?;

            db::update_balance(tx, sender, from.balance - amount)?;
            db::update_balance(tx, receiver, receiver_balance)?;

            Ok((db::fetch(tx, sender)?, db::fetch(tx, receiver)?))
        })?;

        info!(
            sender,
            receiver,
            sender_balance = pair.0.balance,
            receiver_balance = pair.1.balance,
            "transfer committed"
        );
        Ok(pair)
    }
}

/// In-memory ledger holding the two fixture accounts (1001 and 3003, balance
/// 100 each).
#[cfg(test)]
pub(crate) fn seeded_ledger() -> Ledger {
    let ledger = Ledger::open(ConnectionConfig::InMemory).unwrap();
    ledger.read(db::insert_test_data).unwrap();
    ledger
}
