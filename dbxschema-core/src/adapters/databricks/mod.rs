//! Databricks SQL warehouse adapter.
//!
//! Statements go through the SQL Statement Execution API with inline
//! `JSON_ARRAY` results:
//! - `connection`: HTTP client setup, ping and release
//! - `statement`: submit, poll, chunk fetching and cancel
//! - `types`: request and response bodies

mod connection;
mod statement;
pub mod types;

use crate::Result;
use crate::adapters::{ResultSet, StatementExecutor};
use crate::config::ConnectionConfig;
use async_trait::async_trait;

/// Open handle to one SQL warehouse.
///
/// The bearer token lives only inside the HTTP client's default headers,
/// marked sensitive, so `Debug` output never shows it.
#[derive(Debug)]
pub struct DatabricksConnection {
    client: reqwest::Client,
    base_url: String,
    warehouse_id: String,
    catalog: Option<String>,
    schema: Option<String>,
    config: ConnectionConfig,
}

impl DatabricksConnection {
    /// Warehouse this connection submits statements to.
    pub fn warehouse_id(&self) -> &str {
        &self.warehouse_id
    }

    /// Timeouts in effect.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn statements_url(&self) -> String {
        format!("{}/api/2.0/sql/statements", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl StatementExecutor for DatabricksConnection {
    async fn ping(&self) -> Result<()> {
        self.ping_warehouse().await
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        self.run_statement(sql).await
    }
}
