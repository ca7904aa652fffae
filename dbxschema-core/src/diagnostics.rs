//! Best-effort access listings printed before the main query.
//!
//! Each listing runs independently; a failure is recorded in the report and
//! never propagated, so a missing privilege on `information_schema.catalogs`
//! does not hide the schema and table listings.

use crate::adapters::StatementExecutor;
use crate::introspect::{field, optional_field};
use crate::query::{CATALOGS_QUERY, SCHEMAS_QUERY, TABLES_QUERY};
use crate::Result;
use std::fmt;

/// Outcome of one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Heading printed above the entries
    pub title: &'static str,
    /// One line per row
    pub entries: Vec<String>,
    /// Failure message if the listing could not be produced
    pub error: Option<String>,
}

impl Listing {
    fn from_result(title: &'static str, result: Result<Vec<String>>) -> Self {
        match result {
            Ok(entries) => Self {
                title,
                entries,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Debug error: {}", e);
                Self {
                    title,
                    entries: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Catalogs, schemas and tables visible to the current token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    pub catalogs: Listing,
    pub schemas: Listing,
    pub tables: Listing,
}

impl AccessReport {
    /// True if every listing succeeded.
    pub fn is_complete(&self) -> bool {
        [&self.catalogs, &self.schemas, &self.tables]
            .iter()
            .all(|listing| listing.error.is_none())
    }
}

impl fmt::Display for AccessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== DEBUG INFORMATION ===")?;
        for listing in [&self.catalogs, &self.schemas, &self.tables] {
            writeln!(f)?;
            writeln!(f, "{}:", listing.title)?;
            for entry in &listing.entries {
                writeln!(f, "- {}", entry)?;
            }
            if let Some(error) = &listing.error {
                writeln!(f, "Debug error: {}", error)?;
            }
        }
        writeln!(f, "=======================")
    }
}

/// Runs the three access listings.
pub async fn debug_table_access(executor: &dyn StatementExecutor) -> AccessReport {
    AccessReport {
        catalogs: Listing::from_result("Accessible Catalogs", list_catalogs(executor).await),
        schemas: Listing::from_result("Accessible Schemas", list_schemas(executor).await),
        tables: Listing::from_result("Accessible Tables", list_tables(executor).await),
    }
}

async fn list_catalogs(executor: &dyn StatementExecutor) -> Result<Vec<String>> {
    const FUNC: &str = "list_catalogs";

    let result = executor.execute(CATALOGS_QUERY).await.map_err(|e| {
        crate::IntrospectError::query_failed(FUNC, "failed to query catalogs", e)
    })?;
    result
        .rows
        .iter()
        .map(|row| field(FUNC, row, 0, "catalog_name"))
        .collect()
}

async fn list_schemas(executor: &dyn StatementExecutor) -> Result<Vec<String>> {
    const FUNC: &str = "list_schemas";

    let result = executor.execute(SCHEMAS_QUERY).await.map_err(|e| {
        crate::IntrospectError::query_failed(FUNC, "failed to query schemas", e)
    })?;
    result
        .rows
        .iter()
        .map(|row| -> Result<String> {
            Ok(format!(
                "{}.{}",
                field(FUNC, row, 0, "table_catalog")?,
                field(FUNC, row, 1, "table_schema")?
            ))
        })
        .collect()
}

async fn list_tables(executor: &dyn StatementExecutor) -> Result<Vec<String>> {
    const FUNC: &str = "list_tables";

    let result = executor.execute(TABLES_QUERY).await.map_err(|e| {
        crate::IntrospectError::query_failed(FUNC, "failed to query tables", e)
    })?;
    result
        .rows
        .iter()
        .map(|row| -> Result<String> {
            Ok(format!(
                "{}.{}.{} ({})",
                field(FUNC, row, 0, "table_catalog")?,
                field(FUNC, row, 1, "table_schema")?,
                field(FUNC, row, 2, "table_name")?,
                optional_field(row, 3).unwrap_or_default()
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::test_support::CannedExecutor;

    #[tokio::test]
    async fn test_report_lists_everything() {
        let executor = CannedExecutor::default()
            .answer(
                "information_schema.catalogs",
                &["catalog_name"],
                vec![vec![Some("main")], vec![Some("samples")]],
            )
            .answer(
                "SELECT DISTINCT table_catalog, table_schema",
                &["table_catalog", "table_schema"],
                vec![vec![Some("main"), Some("sales")]],
            )
            .answer(
                "table_name, table_type",
                &["table_catalog", "table_schema", "table_name", "table_type"],
                vec![vec![Some("main"), Some("sales"), Some("orders"), Some("MANAGED")]],
            );

        let report = debug_table_access(&executor).await;

        assert!(report.is_complete());
        assert_eq!(report.catalogs.entries, vec!["main", "samples"]);
        assert_eq!(report.schemas.entries, vec!["main.sales"]);
        assert_eq!(report.tables.entries, vec!["main.sales.orders (MANAGED)"]);

        let rendered = report.to_string();
        assert!(rendered.contains("Accessible Catalogs:\n- main\n- samples\n"));
        assert!(rendered.contains("- main.sales.orders (MANAGED)"));
    }

    #[tokio::test]
    async fn test_failed_listing_does_not_stop_the_others() {
        let executor = CannedExecutor::default()
            .fail("information_schema.catalogs", "PERMISSION_DENIED")
            .answer(
                "SELECT DISTINCT table_catalog, table_schema",
                &["table_catalog", "table_schema"],
                vec![vec![Some("main"), Some("sales")]],
            )
            .answer(
                "table_name, table_type",
                &["table_catalog", "table_schema", "table_name", "table_type"],
                vec![],
            );

        let report = debug_table_access(&executor).await;

        assert!(!report.is_complete());
        let error = report.catalogs.error.as_deref().unwrap();
        assert!(error.starts_with("[list_catalogs] failed to query catalogs"));
        assert!(error.contains("PERMISSION_DENIED"));
        assert_eq!(report.schemas.entries, vec!["main.sales"]);
        assert!(report.tables.error.is_none());
        assert!(report.to_string().contains("Debug error: [list_catalogs]"));
    }
}
