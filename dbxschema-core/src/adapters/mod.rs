//! Statement execution seam.
//!
//! The introspection service only needs to run a statement and read back
//! rows of text. [`StatementExecutor`] captures exactly that, so the service
//! can be driven by the Databricks adapter in production and by canned
//! result sets in tests.

pub mod databricks;

use crate::Result;
use async_trait::async_trait;

pub use databricks::DatabricksConnection;

/// One result row; SQL `NULL` is `None`.
pub type Row = Vec<Option<String>>;

/// Column names and rows of a finished statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Rows in result order, each as wide as `columns`
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Creates a result set.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the statement returned no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read-only statement execution against a warehouse.
///
/// # Object Safety
/// This trait is object-safe so callers can hold `&dyn StatementExecutor`.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Checks that the warehouse answers a trivial statement.
    ///
    /// # Errors
    /// Returns a connection error if the statement cannot be run.
    async fn ping(&self) -> Result<()>;

    /// Runs one statement to completion and returns all rows.
    ///
    /// # Errors
    /// Returns a query execution error if the statement is rejected, fails,
    /// is canceled, or times out.
    async fn execute(&self, sql: &str) -> Result<ResultSet>;
}
