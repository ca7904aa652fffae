//! Introspection document model.
//!
//! The document maps `"<schema>.<table>"` to a [`TableDescriptor`]. Field
//! names serialize in camelCase because the downstream connector reads them
//! that way. `BTreeMap` keeps client-assembled output deterministic.

use crate::query::EXCLUDED_SCHEMA;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Column name, equal to its key in [`TableDescriptor::columns`]
    pub name: String,
    /// Declared data type, upper-cased
    pub scalar_type: String,
    /// True iff the source reports the column as nullable
    pub nullable: bool,
}

/// One table of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    /// Source catalog
    pub physical_catalog: String,
    /// Source schema
    pub physical_schema: String,
    /// Always empty; the connector fills it in
    pub catalog: String,
    /// Same as `physical_schema`
    pub schema: String,
    /// Unqualified table name
    pub name: String,
    /// Columns keyed by name
    pub columns: BTreeMap<String, ColumnDescriptor>,
    /// Primary-key detection is disabled, so this is always `null`
    pub primary_keys: Option<Vec<String>>,
    /// Always empty
    pub exported_keys: Vec<String>,
}

impl TableDescriptor {
    /// Document key for this table.
    pub fn key(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// A row of `information_schema.tables`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub table_catalog: String,
    pub table_schema: String,
    pub table_name: String,
    pub table_type: String,
}

/// A row of `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table_catalog: String,
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
}

impl ColumnRow {
    fn descriptor(&self) -> ColumnDescriptor {
        ColumnDescriptor {
            name: self.column_name.clone(),
            scalar_type: self.data_type.to_uppercase(),
            nullable: self.is_nullable == "YES",
        }
    }
}

/// The introspection document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntrospectionDocument {
    tables: BTreeMap<String, TableDescriptor>,
}

impl IntrospectionDocument {
    /// Joins table and column rows the way the warehouse query does.
    ///
    /// Tables are matched to columns on (catalog, schema, table). A table
    /// with no columns is dropped, as are columns whose table is not listed.
    /// Rows in `information_schema` are always skipped. When two catalogs
    /// hold the same `schema.table`, the first table listed keeps the key.
    pub fn assemble(tables: &[TableRow], columns: &[ColumnRow]) -> Self {
        let mut by_table: HashMap<(&str, &str, &str), BTreeMap<String, ColumnDescriptor>> =
            HashMap::new();
        for column in columns {
            by_table
                .entry((
                    column.table_catalog.as_str(),
                    column.table_schema.as_str(),
                    column.table_name.as_str(),
                ))
                .or_default()
                .insert(column.column_name.clone(), column.descriptor());
        }

        let mut document = Self::default();
        for table in tables {
            if table.table_schema == EXCLUDED_SCHEMA {
                continue;
            }

            let Some(table_columns) = by_table.remove(&(
                table.table_catalog.as_str(),
                table.table_schema.as_str(),
                table.table_name.as_str(),
            )) else {
                tracing::debug!(
                    "Skipping {}.{}.{}: no columns",
                    table.table_catalog,
                    table.table_schema,
                    table.table_name
                );
                continue;
            };

            let descriptor = TableDescriptor {
                physical_catalog: table.table_catalog.clone(),
                physical_schema: table.table_schema.clone(),
                catalog: String::new(),
                schema: table.table_schema.clone(),
                name: table.table_name.clone(),
                columns: table_columns,
                primary_keys: None,
                exported_keys: Vec::new(),
            };

            let key = descriptor.key();
            if document.tables.contains_key(&key) {
                tracing::warn!(
                    "Duplicate key '{}' from catalog '{}' ignored",
                    key,
                    table.table_catalog
                );
                continue;
            }
            document.tables.insert(key, descriptor);
        }

        document
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table survived the join.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a table by `"schema.table"`.
    pub fn get(&self, key: &str) -> Option<&TableDescriptor> {
        self.tables.get(key)
    }

    /// Iterates over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Renders the document as 2-space indented JSON.
    ///
    /// # Errors
    /// Returns a formatting error if serialization fails.
    pub fn to_pretty_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::IntrospectError::formatting("failed to serialize document", e))
    }
}
