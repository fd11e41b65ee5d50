//! Connection configuration for the ledger
//!
//! `ConnectionConfig` is what `Ledger::open` consumes. `Target` is the
//! process-level choice between the named databases; the ledger itself never
//! looks at the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable selecting the connection target.
pub const ENV_TARGET: &str = "NETBANK_ENV";

/// Environment variable overriding the database file path.
pub const ENV_DB_PATH: &str = "NETBANK_DB";

/// Default wait for a competing writer to release the database lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the ledger's tables live.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionConfig {
    /// Private in-memory database, dropped with the ledger
    InMemory,

    /// SQLite database file (created if missing)
    File {
        path: PathBuf,
        /// How long a transaction waits for another writer before failing
        busy_timeout: Duration,
    },
}

impl ConnectionConfig {
    /// File-backed config with the default busy timeout.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ConnectionConfig::File {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(self, timeout: Duration) -> Self {
        match self {
            ConnectionConfig::File { path, .. } => ConnectionConfig::File {
                path,
                busy_timeout: timeout,
            },
            ConnectionConfig::InMemory => ConnectionConfig::InMemory,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConnectionConfig::InMemory => ":memory:".to_string(),
            ConnectionConfig::File { path, .. } => path.display().to_string(),
        }
    }
}

/// Named connection targets of the surrounding process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Test,
    Production,
}

impl Target {
    /// Parse a target name. `prod`/`production` select production, anything
    /// else falls back to the test database.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "prod" | "production" => Target::Production,
            _ => Target::Test,
        }
    }

    /// Read the target from `NETBANK_ENV`.
    pub fn from_env() -> Self {
        std::env::var(ENV_TARGET)
            .map(|v| Target::parse(&v))
            .unwrap_or(Target::Test)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Test => "test",
            Target::Production => "production",
        }
    }

    pub fn default_path(&self) -> PathBuf {
        match self {
            Target::Test => PathBuf::from("netbank_test.db"),
            Target::Production => PathBuf::from("netbank.db"),
        }
    }

    /// Resolve to a connection config, honoring an explicit path override.
    pub fn connection(&self, path_override: Option<PathBuf>) -> ConnectionConfig {
        ConnectionConfig::file(path_override.unwrap_or_else(|| self.default_path()))
    }

    /// Resolve using `NETBANK_DB` as the override.
    pub fn connection_from_env(&self) -> ConnectionConfig {
        self.connection(std::env::var(ENV_DB_PATH).ok().map(PathBuf::from))
    }

    /// What the binaries open: an explicit path wins over `NETBANK_DB`, which
    /// wins over the target default. `busy_timeout` replaces the default wait.
    pub fn resolve(
        &self,
        path: Option<PathBuf>,
        busy_timeout: Option<Duration>,
    ) -> ConnectionConfig {
        let config = match path {
            Some(path) => self.connection(Some(path)),
            None => self.connection_from_env(),
        };
        match busy_timeout {
            Some(timeout) => config.with_busy_timeout(timeout),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse() {
        assert_eq!(Target::parse("prod"), Target::Production);
        assert_eq!(Target::parse(" Production "), Target::Production);
        assert_eq!(Target::parse("test"), Target::Test);
        assert_eq!(Target::parse(""), Target::Test);
        assert_eq!(Target::parse("staging"), Target::Test);
    }

    #[test]
    fn test_target_connection_override() {
        let config = Target::Production.connection(Some(PathBuf::from("/tmp/other.db")));
        assert_eq!(config, ConnectionConfig::file("/tmp/other.db"));

        let config = Target::Test.connection(None);
        assert_eq!(config, ConnectionConfig::file("netbank_test.db"));
    }

    #[test]
    fn test_resolve_applies_busy_timeout() {
        let config = Target::Test.resolve(
            Some(PathBuf::from("/tmp/ledger.db")),
            Some(Duration::from_millis(250)),
        );
        assert_eq!(
            config,
            ConnectionConfig::File {
                path: PathBuf::from("/tmp/ledger.db"),
                busy_timeout: Duration::from_millis(250),
            }
        );

        let config = Target::Production.resolve(Some(PathBuf::from("/tmp/ledger.db")), None);
        assert_eq!(config, ConnectionConfig::file("/tmp/ledger.db"));
    }

    #[test]
    fn test_with_busy_timeout() {
        let config = ConnectionConfig::file("a.db").with_busy_timeout(Duration::from_millis(10));
        match config {
            ConnectionConfig::File { busy_timeout, .. } => {
                assert_eq!(busy_timeout, Duration::from_millis(10))
            }
            other => panic!("unexpected config {:?}", other),
        }

        assert_eq!(
            ConnectionConfig::InMemory.with_busy_timeout(Duration::from_secs(1)),
            ConnectionConfig::InMemory
        );
    }
}
