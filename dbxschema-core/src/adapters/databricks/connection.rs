//! Connection setup and release for the Databricks adapter.
//!
//! # Security Features
//! - The bearer header is built from zeroizing memory and marked sensitive
//! - Connection errors mention host and warehouse only, never the token
//! - Every request carries connect and request timeouts

use super::DatabricksConnection;
use crate::config::{ConnectionConfig, DatabricksDsn};
use crate::error::IntrospectError;
use crate::security::AccessToken;
use crate::Result;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

impl DatabricksConnection {
    /// Opens a connection from a parsed DSN and pings the warehouse.
    ///
    /// Timeouts come from [`ConnectionConfig::for_dsn`].
    ///
    /// # Errors
    /// Returns a connection error if the HTTP client cannot be built or the
    /// warehouse does not answer `SELECT 1`.
    pub async fn connect(dsn: &DatabricksDsn) -> Result<Self> {
        Self::connect_with_config(dsn, ConnectionConfig::for_dsn(dsn)).await
    }

    /// Same as [`connect`](Self::connect) with explicit timeouts.
    ///
    /// # Errors
    /// Returns a configuration error for invalid timeouts, or a connection
    /// error as for `connect`.
    pub async fn connect_with_config(dsn: &DatabricksDsn, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!("Connecting to {}", dsn);
        let connection = Self::open(&dsn.base_url, &dsn.warehouse_id, &dsn.token, config)?
            .with_session_defaults(dsn.catalog.clone(), dsn.schema.clone());

        connection.ping_warehouse().await?;
        tracing::info!("Connected to warehouse {}", connection.warehouse_id);

        Ok(connection)
    }

    /// Builds the HTTP client without contacting the warehouse.
    ///
    /// # Errors
    /// Returns a configuration error if the token cannot be used as a header
    /// value, or a connection error if the client cannot be built.
    pub fn open(
        base_url: &str,
        warehouse_id: &str,
        token: &AccessToken,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(token.bearer().as_str()).map_err(|_| {
            IntrospectError::configuration(
                "access token contains characters not allowed in an HTTP header",
            )
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("dbxschema/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IntrospectError::connection_failed("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            warehouse_id: warehouse_id.to_string(),
            catalog: None,
            schema: None,
            config,
        })
    }

    /// Sets the catalog and schema sent with every statement.
    pub fn with_session_defaults(mut self, catalog: Option<String>, schema: Option<String>) -> Self {
        self.catalog = catalog;
        self.schema = schema;
        self
    }

    /// Runs `SELECT 1` to prove the warehouse accepts statements.
    pub(super) async fn ping_warehouse(&self) -> Result<()> {
        tracing::debug!("Pinging warehouse {}", self.warehouse_id);
        self.run_statement("SELECT 1").await.map_err(|e| {
            IntrospectError::connection_failed(
                format!("warehouse {} did not answer", self.warehouse_id),
                e,
            )
        })?;
        Ok(())
    }

    /// Releases the connection.
    ///
    /// Statements are stateless on the server side, so releasing means
    /// dropping the HTTP client and its pooled sockets.
    pub fn close(self) {
        tracing::debug!("Closing connection to warehouse {}", self.warehouse_id);
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_strips_trailing_slash() {
        let token = AccessToken::new("t".to_string());
        let connection = DatabricksConnection::open(
            "https://example.cloud.databricks.com/",
            "w1",
            &token,
            ConnectionConfig::default(),
        )
        .unwrap();

        assert_eq!(
            connection.statements_url(),
            "https://example.cloud.databricks.com/api/2.0/sql/statements"
        );
        assert_eq!(connection.warehouse_id(), "w1");
    }

    #[test]
    fn test_open_rejects_header_unsafe_token() {
        let token = AccessToken::new("bad\ntoken".to_string());
        let err = DatabricksConnection::open(
            "https://example.cloud.databricks.com",
            "w1",
            &token,
            ConnectionConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, IntrospectError::Configuration { .. }));
        assert!(!err.to_string().contains("bad"));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = AccessToken::new("dapiSECRET".to_string());
        let connection = DatabricksConnection::open(
            "https://example.cloud.databricks.com",
            "w1",
            &token,
            ConnectionConfig::default(),
        )
        .unwrap();

        assert!(!format!("{:?}", connection).contains("dapiSECRET"));
    }

    #[tokio::test]
    async fn test_connect_fails_when_ping_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/2.0/sql/statements")
            .with_status(403)
            .with_body(r#"{"error_code":"PERMISSION_DENIED","message":"no access"}"#)
            .create_async()
            .await;

        let dsn = DatabricksDsn::parse(&format!(
            "{}/sql/1.0/warehouses/w1",
            server.url().replacen("http://", "http://token:dapiSECRET@", 1)
        ))
        .unwrap();

        let err = DatabricksConnection::connect(&dsn).await.unwrap_err();
        assert!(matches!(err, IntrospectError::Connection { .. }));
        assert!(!err.to_string().contains("dapiSECRET"));
        mock.assert_async().await;
    }
}
