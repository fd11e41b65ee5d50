// 🗄️ Record Store - account + customer tables in SQLite
//
// Every function takes a `&Connection`. Writes are expected to be issued
// through an open `rusqlite::Transaction` (which derefs to `Connection`); this
// module holds no transaction state of its own.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::entities::{Account, AccountId, Customer};
use crate::error::{LedgerError, Result};

const SELECT_ACCOUNT: &str = "SELECT customer.username, customer.addr, customer.phone,
            account.id, account.balance
     FROM account
     INNER JOIN customer ON account.id = customer.id";

/// Create the two tables if they do not exist yet.
///
/// `durable` switches the journal to WAL, which only applies to file-backed
/// databases.
pub fn setup_database(conn: &Connection, durable: bool) -> Result<()> {
    if durable {
        // Enable WAL mode for crash recovery
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
    }

    // ==========================================================================
    // Account Table (identity + balance)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            balance REAL NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // ==========================================================================
    // Customer Table (profile, shares the account's primary key)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS customer (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            addr TEXT NOT NULL,
            phone TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_balance ON account(balance)",
        [],
    )?;

    Ok(())
}

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        customer: Customer {
            name: row.get(0)?,
            address: row.get(1)?,
            phone: row.get(2)?,
        },
        id: row.get(3)?,
        balance: row.get(4)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Point read of one account and its customer.
pub fn fetch(conn: &Connection, id: AccountId) -> Result<Account> {
    let sql = format!("{} WHERE account.id = ?1", SELECT_ACCOUNT);

    conn.query_row(&sql, [id], row_to_account)
        .optional()?
        .ok_or_else(|| LedgerError::not_found(id))
}

/// Accounts whose balance is within `[min, max]`, in primary-key order.
pub fn fetch_range(conn: &Connection, min: f64, max: f64) -> Result<Vec<Account>> {
    let sql = format!(
        "{} WHERE account.balance >= ?1 AND account.balance <= ?2 ORDER BY account.id",
        SELECT_ACCOUNT
    );
    let mut stmt = conn.prepare(&sql)?;

    let accounts = stmt
        .query_map(params![min, max], row_to_account)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(accounts)
}

/// Whether an account row holds `id`.
pub fn exists(conn: &Connection, id: AccountId) -> Result<bool> {
    let found = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM account WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Insert the customer + account pair with a zero balance.
///
/// Fails with `Conflict` when either row already exists for `id`. On failure
/// the first row may already be written; the caller's transaction must roll
/// back.
pub fn insert(conn: &Connection, id: AccountId, customer: &Customer) -> Result<Account> {
    let result = conn
        .execute(
            "INSERT INTO customer (id, username, addr, phone) VALUES (?1, ?2, ?3, ?4)",
            params![id, customer.name, customer.address, customer.phone],
        )
        .and_then(|_| {
            conn.execute(
                "INSERT INTO account (id, balance) VALUES (?1, ?2)",
                params![id, 0.0_f64],
            )
        });

    match result {
        Ok(_) => Ok(Account::open(id, customer.clone())),
        Err(e) if is_constraint_violation(&e) => Err(LedgerError::Conflict { id }),
        Err(e) => Err(e.into()),
    }
}

/// Overwrite the balance column of one account.
pub fn update_balance(conn: &Connection, id: AccountId, balance: f64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        params![balance, id],
    )?;

    if changed == 0 {
        return Err(LedgerError::not_found(id));
    }
    Ok(())
}

/// Overwrite all three customer fields of one account.
pub fn update_customer(conn: &Connection, id: AccountId, customer: &Customer) -> Result<()> {
    let changed = conn.execute(
        "UPDATE customer SET username = ?1, addr = ?2, phone = ?3 WHERE id = ?4",
        params![customer.name, customer.address, customer.phone, id],
    )?;

    if changed == 0 {
        return Err(LedgerError::not_found(id));
    }
    Ok(())
}

/// Remove both rows of an account.
pub fn delete(conn: &Connection, id: AccountId) -> Result<()> {
    let changed = conn.execute("DELETE FROM account WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(LedgerError::not_found(id));
    }

    conn.execute("DELETE FROM customer WHERE id = ?1", [id])?;
    Ok(())
}

pub fn count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM account", [], |row| row.get(0))?;
    Ok(count)
}

/// Seeds the two fixture accounts used across the test suites.
#[cfg(test)]
pub(crate) fn insert_test_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "INSERT INTO customer (id, username, addr, phone)
         VALUES (1001, 'John', 'Los Angeles, California', '(213) 444 0147');
         INSERT INTO account (id, balance) VALUES (1001, 100);
         INSERT INTO customer (id, username, addr, phone)
         VALUES (3003, 'Ide Non No', 'Ta No Tsu', '(0120) 117 117');
         INSERT INTO account (id, balance) VALUES (3003, 100);",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn, false).unwrap();
        insert_test_data(&conn).unwrap();
        conn
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = test_conn();
        setup_database(&conn, false).unwrap();
        assert_eq!(count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_fetch_joins_customer() {
        let conn = test_conn();
        let account = fetch(&conn, 1001).unwrap();

        assert_eq!(account.id, 1001);
        assert_eq!(account.balance, 100.0);
        assert_eq!(account.customer.name, "John");
        assert_eq!(account.customer.address, "Los Angeles, California");
        assert_eq!(account.customer.phone, "(213) 444 0147");
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let conn = test_conn();
        let err = fetch(&conn, 404).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { id: 404, .. }));
    }

    #[test]
    fn test_fetch_range_filters_inclusive_bounds() {
        let conn = test_conn();
        update_balance(&conn, 3003, 250.0).unwrap();

        let all = fetch_range(&conn, 0.0, 1000.0).unwrap();
        assert_eq!(all.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1001, 3003]);

        let low = fetch_range(&conn, 100.0, 100.0).unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, 1001);

        let none = fetch_range(&conn, 300.0, 1000.0).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_insert_creates_both_rows() {
        let conn = test_conn();
        let customer = Customer::new("Jane", "NYC", "777");

        let account = insert(&conn, 42, &customer).unwrap();
        assert_eq!(account.balance, 0.0);
        assert_eq!(fetch(&conn, 42).unwrap(), account);
    }

    #[test]
    fn test_insert_duplicate_is_conflict() {
        let conn = test_conn();
        let err = insert(&conn, 1001, &Customer::new("Jane", "NYC", "777")).unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { id: 1001 }));
    }

    #[test]
    fn test_update_customer_overwrites_fields() {
        let conn = test_conn();
        let customer = Customer::new("Johnny", "San Diego", "(619) 000 0000");

        update_customer(&conn, 1001, &customer).unwrap();
        let account = fetch(&conn, 1001).unwrap();
        assert_eq!(account.customer, customer);
        assert_eq!(account.balance, 100.0);
    }

    #[test]
    fn test_updates_on_missing_account() {
        let conn = test_conn();
        assert!(matches!(
            update_balance(&conn, 404, 1.0).unwrap_err(),
            LedgerError::NotFound { .. }
        ));
        assert!(matches!(
            update_customer(&conn, 404, &Customer::new("a", "b", "c")).unwrap_err(),
            LedgerError::NotFound { .. }
        ));
    }

    #[test]
    fn test_delete_removes_both_rows() {
        let conn = test_conn();
        delete(&conn, 1001).unwrap();

        let customers: i64 = conn
            .query_row("SELECT COUNT(*) FROM customer WHERE id = 1001", [], |r| r.get(0))
            .unwrap();
        assert_eq!(customers, 0);
        assert_eq!(count(&conn).unwrap(), 1);

        assert!(matches!(
            delete(&conn, 1001).unwrap_err(),
            LedgerError::NotFound { id: 1001, .. }
        ));
    }

    #[test]
    fn test_exists() {
        let conn = test_conn();
        assert!(exists(&conn, 1001).unwrap());
        assert!(exists(&conn, 3003).unwrap());
        assert!(!exists(&conn, 2002).unwrap());

        delete(&conn, 1001).unwrap();
        assert!(!exists(&conn, 1001).unwrap());
    }
}
