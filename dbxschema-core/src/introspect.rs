//! Introspection runs against a [`StatementExecutor`].
//!
//! Two ways to obtain the document:
//! - [`fetch_document_json`] lets the warehouse build it with one statement
//!   and returns the JSON text untouched
//! - [`assemble_document`] runs two flat listings and joins them locally

use crate::adapters::{ResultSet, Row, StatementExecutor};
use crate::error::IntrospectError;
use crate::models::{ColumnRow, IntrospectionDocument, TableRow};
use crate::query::{
    IntrospectionFilter, build_column_listing_query, build_introspection_query,
    build_table_listing_query,
};
use crate::Result;

/// Builds the introspection query for `filter` and returns the warehouse's
/// JSON text.
///
/// # Errors
/// See [`execute_query`].
pub async fn fetch_document_json(
    executor: &dyn StatementExecutor,
    filter: &IntrospectionFilter,
) -> Result<String> {
    let query = build_introspection_query(filter);
    tracing::debug!("Query: {}", query);
    execute_query(executor, &query).await
}

/// Runs `query` and returns its single text value.
///
/// The result must be exactly one row with exactly one non-null column.
///
/// # Errors
/// Returns a query execution error tagged `execute_query` when the statement
/// fails or the result has any other shape.
pub async fn execute_query(executor: &dyn StatementExecutor, query: &str) -> Result<String> {
    const FUNC: &str = "execute_query";

    let result = executor
        .execute(query)
        .await
        .map_err(|e| IntrospectError::query_failed(FUNC, "failed to execute query", e))?;

    single_text_value(FUNC, result)
}

fn single_text_value(function: &'static str, result: ResultSet) -> Result<String> {
    let row_count = result.rows.len();
    let mut rows = result.rows.into_iter();
    let (Some(row), None) = (rows.next(), rows.next()) else {
        return Err(IntrospectError::query_rejected(
            function,
            "unexpected result shape",
            format!("expected exactly one row, got {}", row_count),
        ));
    };

    let width = row.len();
    let mut values = row.into_iter();
    match (values.next(), values.next()) {
        (Some(Some(text)), None) => Ok(text),
        (Some(None), None) => Err(IntrospectError::query_rejected(
            function,
            "unexpected result shape",
            "the single column is NULL",
        )),
        _ => Err(IntrospectError::query_rejected(
            function,
            "unexpected result shape",
            format!("expected exactly one column, got {}", width),
        )),
    }
}

/// Builds the document client-side from flat table and column listings.
///
/// Both listings use the same filter and `information_schema` exclusion as
/// the warehouse query, and the join drops tables without columns.
///
/// # Errors
/// Returns a query execution error tagged `assemble_document` if either
/// listing fails or a row is missing a value.
pub async fn assemble_document(
    executor: &dyn StatementExecutor,
    filter: &IntrospectionFilter,
) -> Result<IntrospectionDocument> {
    const FUNC: &str = "assemble_document";

    let tables = executor
        .execute(&build_table_listing_query(filter))
        .await
        .map_err(|e| IntrospectError::query_failed(FUNC, "failed to list tables", e))?;
    let tables = tables
        .rows
        .iter()
        .map(|row| -> Result<TableRow> {
            Ok(TableRow {
                table_catalog: field(FUNC, row, 0, "table_catalog")?,
                table_schema: field(FUNC, row, 1, "table_schema")?,
                table_name: field(FUNC, row, 2, "table_name")?,
                table_type: optional_field(row, 3).unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let columns = executor
        .execute(&build_column_listing_query(filter))
        .await
        .map_err(|e| IntrospectError::query_failed(FUNC, "failed to list columns", e))?;
    let columns = columns
        .rows
        .iter()
        .map(|row| -> Result<ColumnRow> {
            Ok(ColumnRow {
                table_catalog: field(FUNC, row, 0, "table_catalog")?,
                table_schema: field(FUNC, row, 1, "table_schema")?,
                table_name: field(FUNC, row, 2, "table_name")?,
                column_name: field(FUNC, row, 3, "column_name")?,
                data_type: field(FUNC, row, 4, "data_type")?,
                is_nullable: optional_field(row, 5).unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Assembling document from {} tables and {} columns",
        tables.len(),
        columns.len()
    );
    Ok(IntrospectionDocument::assemble(&tables, &columns))
}

/// Reads a required text value from a row.
pub(crate) fn field(function: &'static str, row: &Row, index: usize, name: &str) -> Result<String> {
    optional_field(row, index).ok_or_else(|| {
        IntrospectError::query_rejected(
            function,
            "unexpected result shape",
            format!("missing value for {}", name),
        )
    })
}

pub(crate) fn optional_field(row: &Row, index: usize) -> Option<String> {
    row.get(index).cloned().flatten()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::Result;
    use crate::adapters::{ResultSet, StatementExecutor};
    use crate::error::IntrospectError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Executor that answers statements by matching a substring.
    #[derive(Default)]
    pub(crate) struct CannedExecutor {
        answers: Vec<(&'static str, std::result::Result<ResultSet, String>)>,
        pub(crate) seen: Mutex<Vec<String>>,
    }

    impl CannedExecutor {
        pub(crate) fn answer(
            mut self,
            needle: &'static str,
            columns: &[&str],
            rows: Vec<Vec<Option<&str>>>,
        ) -> Self {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(|v| v.map(str::to_string)).collect())
                .collect();
            let columns = columns.iter().map(|c| (*c).to_string()).collect();
            self.answers.push((needle, Ok(ResultSet::new(columns, rows))));
            self
        }

        pub(crate) fn fail(mut self, needle: &'static str, message: &str) -> Self {
            self.answers.push((needle, Err(message.to_string())));
            self
        }
    }

    #[async_trait]
    impl StatementExecutor for CannedExecutor {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn execute(&self, sql: &str) -> Result<ResultSet> {
            self.seen.lock().unwrap().push(sql.to_string());
            for (needle, answer) in &self.answers {
                if sql.contains(needle) {
                    return answer.clone().map_err(|message| {
                        IntrospectError::query_rejected("execute", "canned failure", message)
                    });
                }
            }
            Err(IntrospectError::query_rejected(
                "execute",
                "canned failure",
                "no canned answer",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::CannedExecutor;
    use super::*;

    fn filter(catalog: &str, schema: &str) -> IntrospectionFilter {
        IntrospectionFilter::new(Some(catalog.to_string()), Some(schema.to_string()))
    }

    #[tokio::test]
    async fn test_fetch_document_returns_single_value() {
        let executor = CannedExecutor::default().answer(
            "WITH column_info",
            &["tables"],
            vec![vec![Some(r#"{"sales.orders":{}}"#)]],
        );

        let json = fetch_document_json(&executor, &filter("prod", "sales"))
            .await
            .unwrap();

        assert_eq!(json, r#"{"sales.orders":{}}"#);
        let seen = executor.seen.lock().unwrap();
        assert!(seen[0].contains("t.table_catalog = 'prod'"));
        assert!(seen[0].contains("t.table_schema = 'sales'"));
    }

    #[tokio::test]
    async fn test_execute_query_wraps_failure_with_function_name() {
        let executor = CannedExecutor::default().fail("SELECT", "PERMISSION_DENIED");

        let err = execute_query(&executor, "SELECT 1").await.unwrap_err();

        assert_eq!(err.function(), Some("execute_query"));
        let message = err.to_string();
        assert!(message.starts_with("[execute_query] failed to execute query"));
        assert!(message.contains("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn test_execute_query_rejects_zero_rows() {
        let executor = CannedExecutor::default().answer("SELECT", &["tables"], vec![]);
        let err = execute_query(&executor, "SELECT 1").await.unwrap_err();
        assert!(err.to_string().contains("expected exactly one row, got 0"));
    }

    #[tokio::test]
    async fn test_execute_query_rejects_two_rows() {
        let executor = CannedExecutor::default().answer(
            "SELECT",
            &["tables"],
            vec![vec![Some("{}")], vec![Some("{}")]],
        );
        let err = execute_query(&executor, "SELECT 1").await.unwrap_err();
        assert!(err.to_string().contains("got 2"));
    }

    #[tokio::test]
    async fn test_execute_query_rejects_two_columns() {
        let executor =
            CannedExecutor::default().answer("SELECT", &["a", "b"], vec![vec![Some("{}"), Some("{}")]]);
        let err = execute_query(&executor, "SELECT 1").await.unwrap_err();
        assert!(err.to_string().contains("expected exactly one column, got 2"));
    }

    #[tokio::test]
    async fn test_execute_query_rejects_null_value() {
        // An empty result set aggregates to a single NULL
        let executor = CannedExecutor::default().answer("SELECT", &["tables"], vec![vec![None]]);
        let err = execute_query(&executor, "SELECT 1").await.unwrap_err();
        assert!(err.to_string().contains("NULL"));
    }

    #[tokio::test]
    async fn test_assemble_document_inner_join() {
        let executor = CannedExecutor::default()
            .answer(
                "FROM information_schema.tables t",
                &["table_catalog", "table_schema", "table_name", "table_type"],
                vec![
                    vec![Some("main"), Some("sales"), Some("orders"), Some("MANAGED")],
                    vec![Some("main"), Some("reporting"), Some("orders"), Some("VIEW")],
                    vec![Some("main"), Some("sales"), Some("empty"), Some("MANAGED")],
                ],
            )
            .answer(
                "FROM information_schema.columns t",
                &[
                    "table_catalog",
                    "table_schema",
                    "table_name",
                    "column_name",
                    "data_type",
                    "is_nullable",
                ],
                vec![
                    vec![Some("main"), Some("sales"), Some("orders"), Some("id"), Some("bigint"), Some("NO")],
                    vec![Some("main"), Some("sales"), Some("orders"), Some("note"), Some("varchar"), Some("YES")],
                    vec![Some("main"), Some("reporting"), Some("orders"), Some("total"), Some("double"), None],
                ],
            );

        let document = assemble_document(&executor, &IntrospectionFilter::default())
            .await
            .unwrap();

        assert_eq!(document.len(), 2);
        assert!(document.get("sales.empty").is_none());
        let sales = document.get("sales.orders").unwrap();
        assert_eq!(sales.columns["note"].scalar_type, "VARCHAR");
        assert!(sales.columns["note"].nullable);
        let reporting = document.get("reporting.orders").unwrap();
        assert!(!reporting.columns["total"].nullable);
    }

    #[tokio::test]
    async fn test_assemble_document_missing_value() {
        let executor = CannedExecutor::default().answer(
            "FROM information_schema.tables t",
            &["table_catalog", "table_schema", "table_name", "table_type"],
            vec![vec![Some("main"), None, Some("orders"), Some("MANAGED")]],
        );

        let err = assemble_document(&executor, &IntrospectionFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.function(), Some("assemble_document"));
        assert!(err.to_string().contains("table_schema"));
    }
}
