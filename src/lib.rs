// NetBank Ledger - Core Library
// Exposes the ledger for use in the CLI, the API server, and tests

pub mod allocator;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ledger;
pub mod query;

#[cfg(feature = "server")]
pub mod http;

// Re-export commonly used types
pub use allocator::MAX_ALLOCATION_ATTEMPTS;
pub use config::{ConnectionConfig, Target};
pub use entities::{Account, AccountId, Customer, MAX_ACCOUNT_ID};
pub use error::{LedgerError, Party, Result};
pub use ledger::Ledger;
pub use query::{DEFAULT_MAX_BALANCE, DEFAULT_MIN_BALANCE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `tracing` subscriber shared by the binaries. `RUST_LOG`
/// overrides the default filter.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,netbank=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
