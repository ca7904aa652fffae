//! Error types with access-token sanitization.
//!
//! Every fatal condition of an introspection run maps to one variant of
//! [`IntrospectError`]. Connection strings carry a personal access token, so
//! nothing in this module ever formats a raw DSN; use [`redact_dsn`] before a
//! connection string reaches a log line or an error message.

use thiserror::Error;

/// Main error type for dbxschema operations.
///
/// # Security
/// Error messages never include the access token. Connection context is
/// limited to host and warehouse information.
#[derive(Debug, Error)]
pub enum IntrospectError {
    /// Required configuration missing or malformed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Opening or pinging the warehouse failed
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A statement failed to execute or returned an unexpected shape
    #[error("[{function}] {context}: {source}")]
    QueryExecution {
        function: &'static str,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The warehouse returned text that is not valid JSON
    #[error("Error formatting JSON: {context}")]
    Formatting {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the document to its destination failed
    #[error("Error writing output: {context}")]
    Output {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with [`IntrospectError`]
pub type Result<T> = std::result::Result<T, IntrospectError>;

/// Plain-text cause used when the failure has no underlying error value,
/// such as a statement reported as `FAILED` by the warehouse.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StatementFailure(pub String);

/// Masks the access token in a Databricks DSN for logging.
///
/// Accepts DSNs with or without the `https://` prefix. Anything that cannot
/// be parsed is replaced wholesale.
///
/// # Example
///
/// ```rust
/// use dbxschema_core::error::redact_dsn;
///
/// let sanitized = redact_dsn("token:dapi123@adb-1.azuredatabricks.net/sql/1.0/warehouses/abc");
/// assert_eq!(sanitized, "token:****@adb-1.azuredatabricks.net/sql/1.0/warehouses/abc");
/// assert!(!sanitized.contains("dapi123"));
/// ```
pub fn redact_dsn(dsn: &str) -> String {
    let (prefixed, had_scheme) = if dsn.contains("://") {
        (dsn.to_string(), true)
    } else {
        (format!("https://{dsn}"), false)
    };

    match url::Url::parse(&prefixed) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("****"));
            }
            let rendered = parsed.to_string();
            if had_scheme {
                rendered
            } else {
                rendered
                    .strip_prefix("https://")
                    .map_or(rendered.clone(), str::to_string)
            }
        }
        Err(_) => "<redacted>".to_string(),
    }
}

impl IntrospectError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a connection error with sanitized context
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a query execution error tagged with the calling function
    pub fn query_failed<E>(function: &'static str, context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::QueryExecution {
            function,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a query execution error from a message with no underlying cause
    pub fn query_rejected(
        function: &'static str,
        context: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::query_failed(function, context, StatementFailure(reason.into()))
    }

    /// Creates a formatting error
    pub fn formatting(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Formatting {
            context: context.into(),
            source,
        }
    }

    /// Creates an output error
    pub fn output(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Output {
            context: context.into(),
            source,
        }
    }

    /// Name of the function that raised a query execution error.
    pub fn function(&self) -> Option<&'static str> {
        match self {
            Self::QueryExecution { function, .. } => Some(*function),
            _ => None,
        }
    }
}
