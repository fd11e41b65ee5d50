//! Error types for the ledger
//!
//! Every operation returns a typed failure instead of panicking, so callers
//! have to handle each kind explicitly.

use std::fmt;

use thiserror::Error;

use crate::entities::AccountId;

/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Which side of an operation a missing account was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    /// Single-account operations (get, update, delete, deposit, withdraw)
    Account,
    /// Debited side of a transfer
    Sender,
    /// Credited side of a transfer
    Receiver,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Account => "account",
            Party::Sender => "sender",
            Party::Receiver => "receiver",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    // -------------------------------------------------------------------------
    // Business validation
    // -------------------------------------------------------------------------
    #[error("amount must be greater than 0, got {amount}")]
    InvalidAmount { amount: f64 },

    #[error("insufficient funds in account {id}: balance is {balance}, requested {amount}")]
    InsufficientFunds {
        id: AccountId,
        balance: f64,
        amount: f64,
    },

    #[error("{party}'s account (ID: {id}) is not found")]
    NotFound { id: AccountId, party: Party },

    #[error("account id {id} is already in use")]
    Conflict { id: AccountId },

    #[error("balance of account {id} is negative ({balance}); refusing to proceed")]
    CorruptState { id: AccountId, balance: f64 },

    #[error("balance of account {id} would overflow: {balance} + {amount}")]
    BalanceOverflow {
        id: AccountId,
        balance: f64,
        amount: f64,
    },

    #[error("cannot transfer from account {id} to itself")]
    SelfTransfer { id: AccountId },

    // -------------------------------------------------------------------------
    // Storage
    // -------------------------------------------------------------------------
    #[error("connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl LedgerError {
    /// Shorthand for the single-account not-found case.
    pub fn not_found(id: AccountId) -> Self {
        LedgerError::NotFound {
            id,
            party: Party::Account,
        }
    }

    /// Re-labels a not-found error with the transfer side it belongs to.
    /// Other kinds pass through untouched.
    pub fn for_party(self, party: Party) -> Self {
        match self {
            LedgerError::NotFound { id, .. } => LedgerError::NotFound { id, party },
            other => other,
        }
    }

    /// True for failures caused by the request itself rather than storage.
    pub fn is_business(&self) -> bool {
        !matches!(self, LedgerError::Connection(_) | LedgerError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_party_relabels_not_found() {
        let err = LedgerError::not_found(404).for_party(Party::Receiver);

        match err {
            LedgerError::NotFound { id, party } => {
                assert_eq!(id, 404);
                assert_eq!(party, Party::Receiver);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_for_party_leaves_other_kinds_alone() {
        let err = LedgerError::InvalidAmount { amount: -5.0 }.for_party(Party::Sender);
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }

    #[test]
    fn test_not_found_message_names_the_party() {
        let err = LedgerError::NotFound {
            id: 404,
            party: Party::Receiver,
        };
        assert_eq!(err.to_string(), "receiver's account (ID: 404) is not found");
    }

    #[test]
    fn test_is_business() {
        assert!(LedgerError::Conflict { id: 1 }.is_business());
        assert!(!LedgerError::Store(rusqlite::Error::InvalidQuery).is_business());
    }
}
