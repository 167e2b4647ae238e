//! ClickHouse client wrapper.

use clickhouse::query::Query;
use clickhouse::Client;
use gateway_core::{Error, Result};
use serde::Deserialize;
use tracing::info;

use crate::config::StoreConfig;
use crate::params::SqlParam;

/// Long-lived ClickHouse client with positional parameter binding.
///
/// Safe for concurrent use; the underlying driver pools HTTP connections.
#[derive(Clone)]
pub struct Store {
    inner: Client,
    config: StoreConfig,
}

impl Store {
    /// Creates a new store handle. Does not touch the network; call
    /// [`Store::ping`] to verify reachability.
    pub fn new(config: StoreConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.addr)
            .with_database(&config.database)
            .with_option(
                "max_execution_time",
                config.statement_timeout_secs.to_string(),
            );

        if let Some(ref user) = config.username {
            client = client.with_user(user);
        }

        if let Some(ref pass) = config.password {
            client = client.with_password(pass);
        }

        info!(
            addr = %config.addr,
            database = %config.database,
            "created ClickHouse client"
        );

        Self {
            inner: client,
            config,
        }
    }

    /// Returns the inner driver client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Verify the store is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.inner
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .map_err(|e| Error::store(format!("ping failed: {e}")))?;
        Ok(())
    }

    fn bind_all(&self, sql: &str, params: &[SqlParam]) -> Query {
        let mut query = self.inner.query(sql);
        for param in params {
            query = param.bind_to(query);
        }
        query
    }

    /// Execute a read statement and collect every row.
    pub async fn fetch_all<T>(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<T>>
    where
        T: clickhouse::Row + for<'b> Deserialize<'b>,
    {
        self.bind_all(sql, params)
            .fetch_all::<T>()
            .await
            .map_err(|e| Error::store(format!("query failed: {e}")))
    }

    /// Execute a read statement expected to return exactly one row.
    pub async fn fetch_one<T>(&self, sql: &str, params: &[SqlParam]) -> Result<T>
    where
        T: clickhouse::Row + for<'b> Deserialize<'b>,
    {
        self.bind_all(sql, params)
            .fetch_one::<T>()
            .await
            .map_err(|e| Error::store(format!("query failed: {e}")))
    }

    /// Execute a read statement returning zero or one row.
    pub async fn fetch_optional<T>(&self, sql: &str, params: &[SqlParam]) -> Result<Option<T>>
    where
        T: clickhouse::Row + for<'b> Deserialize<'b>,
    {
        self.bind_all(sql, params)
            .fetch_optional::<T>()
            .await
            .map_err(|e| Error::store(format!("query failed: {e}")))
    }

    /// Execute a statement that returns no rows.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        self.inner
            .query(sql)
            .execute()
            .await
            .map_err(|e| Error::store(format!("statement failed: {e}")))
    }
}
