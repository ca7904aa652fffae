//! Connection configuration: DSN parsing and client timeouts.
//!
//! The DSN follows the Databricks SQL driver format:
//!
//! ```text
//! [https://]token:<personal-access-token>@<host>[:<port>]/<http-path>[?timeout=<secs>&catalog=<c>&schema=<s>]
//! ```
//!
//! The warehouse id is the last segment of the HTTP path, e.g.
//! `/sql/1.0/warehouses/1234abcd` or the older `/sql/1.0/endpoints/1234abcd`.

use crate::error::IntrospectError;
use crate::security::AccessToken;
use crate::Result;
use std::time::Duration;

/// Environment variable holding the connection string.
pub const DSN_ENV_VAR: &str = "DATABRICKS_DSN";

/// Parsed Databricks connection string.
#[derive(Debug, Clone)]
pub struct DatabricksDsn {
    /// Scheme, host and explicit port, without a trailing slash
    pub base_url: String,
    /// Workspace host name
    pub host: String,
    /// HTTP path of the SQL warehouse
    pub http_path: String,
    /// Warehouse id taken from the HTTP path
    pub warehouse_id: String,
    /// Bearer credential
    pub token: AccessToken,
    /// Default catalog forwarded with every statement
    pub catalog: Option<String>,
    /// Default schema forwarded with every statement
    pub schema: Option<String>,
    /// Overall budget for one statement, from `?timeout=<secs>`
    pub statement_timeout: Option<Duration>,
}

impl DatabricksDsn {
    /// Parses a DSN.
    ///
    /// # Errors
    /// Returns a configuration error when the string is empty, unparseable,
    /// has no token, no host or no warehouse path. The DSN itself is never
    /// echoed in the error.
    pub fn parse(dsn: &str) -> Result<Self> {
        let dsn = dsn.trim();
        if dsn.is_empty() {
            return Err(IntrospectError::configuration(format!(
                "No connection string found. Set the {} environment variable.",
                DSN_ENV_VAR
            )));
        }

        let prefixed = if dsn.contains("://") {
            dsn.to_string()
        } else {
            format!("https://{dsn}")
        };

        let parsed = url::Url::parse(&prefixed).map_err(|e| {
            IntrospectError::configuration(format!("{} is not a valid DSN: {}", DSN_ENV_VAR, e))
        })?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| IntrospectError::configuration("DSN is missing the workspace host"))?
            .to_string();

        let token = parsed
            .password()
            .map(|p| AccessToken::new(p.to_string()))
            .filter(|t| !t.is_blank())
            .ok_or_else(|| {
                IntrospectError::configuration(
                    "DSN must carry a personal access token (token:<PAT>@host/...)",
                )
            })?;

        let http_path = parsed.path().trim_end_matches('/').to_string();
        let warehouse_id = http_path
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                IntrospectError::configuration(
                    "DSN is missing the warehouse HTTP path (e.g. /sql/1.0/warehouses/<id>)",
                )
            })?
            .to_string();

        let mut catalog = None;
        let mut schema = None;
        let mut statement_timeout = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "catalog" if !value.is_empty() => catalog = Some(value.into_owned()),
                "schema" if !value.is_empty() => schema = Some(value.into_owned()),
                "timeout" => {
                    let secs: u64 = value.parse().map_err(|_| {
                        IntrospectError::configuration(format!(
                            "DSN timeout must be a whole number of seconds, got '{}'",
                            value
                        ))
                    })?;
                    statement_timeout = Some(Duration::from_secs(secs));
                }
                other => tracing::debug!("Ignoring DSN parameter '{}'", other),
            }
        }

        let base_url = match parsed.port() {
            Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
            None => format!("{}://{}", parsed.scheme(), host),
        };

        Ok(Self {
            base_url,
            host,
            http_path,
            warehouse_id,
            token,
            catalog,
            schema,
            statement_timeout,
        })
    }
}

impl std::fmt::Display for DatabricksDsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token intentionally omitted
        write!(f, "{} (warehouse {})", self.base_url, self.warehouse_id)
    }
}

/// Client-side timeouts for the Statement Execution API.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Timeout for any single HTTP request
    pub request_timeout: Duration,
    /// Server-side wait requested on submit, 0 or 5 to 50 seconds
    pub wait_timeout: Duration,
    /// Delay between status polls of a running statement
    pub poll_interval: Duration,
    /// Overall budget for one statement including polling
    pub statement_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            wait_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            statement_timeout: Duration::from_secs(300),
        }
    }
}

impl ConnectionConfig {
    /// Applies DSN overrides on top of the defaults.
    pub fn for_dsn(dsn: &DatabricksDsn) -> Self {
        let mut config = Self::default();
        if let Some(timeout) = dsn.statement_timeout {
            config.statement_timeout = timeout;
        }
        config
    }

    /// Builder method to set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method to set the overall statement budget.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Builder method to set the server-side wait on submit.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Renders the `wait_timeout` request field, e.g. `"30s"`.
    pub fn wait_timeout_param(&self) -> String {
        format!("{}s", self.wait_timeout.as_secs())
    }

    /// Validates the timeouts.
    ///
    /// # Errors
    /// Returns error if a timeout is zero or the wait is outside what the
    /// API accepts.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(IntrospectError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(IntrospectError::configuration(
                "request_timeout must be greater than 0",
            ));
        }

        let wait = self.wait_timeout.as_secs();
        if wait != 0 && !(5..=50).contains(&wait) {
            return Err(IntrospectError::configuration(
                "wait_timeout must be 0 or between 5 and 50 seconds",
            ));
        }

        if self.statement_timeout.is_zero() {
            return Err(IntrospectError::configuration(
                "statement timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}
