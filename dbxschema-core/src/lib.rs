//! Core library for dbxschema.
//!
//! dbxschema reads catalog, schema, table and column metadata from a
//! Databricks SQL warehouse and produces one JSON document that maps
//! `"<schema>.<table>"` to a table descriptor for a downstream connector.
//!
//! # Security Guarantees
//! - All statements are read-only `information_schema` queries
//! - The access token is held in zeroizing memory and never logged
//!
//! # Architecture
//! - [`query`] builds the introspection statement (pure string building)
//! - [`adapters`] executes statements; [`adapters::databricks`] talks to the
//!   Statement Execution API
//! - [`introspect`] enforces the one-row, one-column result contract and
//!   offers client-side document assembly
//! - [`diagnostics`] lists accessible objects, best effort

pub mod adapters;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod introspect;
pub mod logging;
pub mod models;
pub mod query;
pub mod security;

// Re-export commonly used types
pub use adapters::{DatabricksConnection, ResultSet, StatementExecutor};
pub use config::{ConnectionConfig, DSN_ENV_VAR, DatabricksDsn};
pub use error::{IntrospectError, Result};
pub use logging::init_logging;
pub use models::{ColumnDescriptor, IntrospectionDocument, TableDescriptor};
pub use query::{IntrospectionFilter, build_introspection_query};
