//! ClickHouse connection configuration.

use serde::{Deserialize, Serialize};

/// ClickHouse client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// ClickHouse HTTP URL.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Server-side statement timeout in seconds.
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

fn default_addr() -> String {
    "http://localhost:8123".to_string()
}

fn default_database() -> String {
    "monitor".to_string()
}

fn default_statement_timeout_secs() -> u64 {
    gateway_core::limits::STORE_STATEMENT_TIMEOUT_SECS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            database: default_database(),
            username: None,
            password: None,
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}
