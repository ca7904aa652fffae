//! Introspection query construction.
//!
//! Everything here is pure string building and cannot fail. Filter values are
//! spliced into the SQL as single-quoted literals exactly as given: quote
//! characters are not escaped and no bind parameters are used. Callers that
//! accept filters from untrusted input must validate them first.

/// Schema that is always left out of the document.
pub const EXCLUDED_SCHEMA: &str = "information_schema";

/// Lists every catalog the token can see.
pub const CATALOGS_QUERY: &str = "
    SELECT DISTINCT catalog_name
    FROM information_schema.catalogs
    ORDER BY catalog_name";

/// Lists every (catalog, schema) pair that holds at least one table.
pub const SCHEMAS_QUERY: &str = "
    SELECT DISTINCT table_catalog, table_schema
    FROM information_schema.tables
    ORDER BY table_catalog, table_schema";

/// Lists every table with its type.
pub const TABLES_QUERY: &str = "
    SELECT table_catalog, table_schema, table_name, table_type
    FROM information_schema.tables
    ORDER BY table_catalog, table_schema, table_name";

/// Optional catalog and schema restriction for the introspection query.
///
/// An empty string is the same as no filter; it never means "match the
/// empty name".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntrospectionFilter {
    catalog: Option<String>,
    schema: Option<String>,
}

impl IntrospectionFilter {
    /// Builds a filter, treating empty strings as unset.
    pub fn new(catalog: Option<String>, schema: Option<String>) -> Self {
        Self {
            catalog: catalog.filter(|c| !c.is_empty()),
            schema: schema.filter(|s| !s.is_empty()),
        }
    }

    /// Catalog restriction, if any.
    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    /// Schema restriction, if any.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// `WHERE` clause shared by every table-level query: the
    /// `information_schema` exclusion plus one conjunction per set filter.
    fn where_clause(&self) -> String {
        let mut clause = format!("WHERE t.table_schema != '{}'", EXCLUDED_SCHEMA);
        if let Some(catalog) = self.catalog() {
            clause.push_str(&format!("\n        AND t.table_catalog = '{}'", catalog));
        }
        if let Some(schema) = self.schema() {
            clause.push_str(&format!("\n        AND t.table_schema = '{}'", schema));
        }
        clause
    }
}

/// Builds the single statement whose one row, one column result is the full
/// introspection document as JSON text.
///
/// Columns are folded into a `name -> {name, scalarType, nullable}` map per
/// table, then tables into a `"schema.table" -> descriptor` map serialized
/// with `to_json`. The inner join drops tables that have no columns.
pub fn build_introspection_query(filter: &IntrospectionFilter) -> String {
    format!(
        "
    WITH column_info AS (
        SELECT
            t.table_catalog,
            t.table_schema,
            t.table_name,
            t.table_type,
            map_from_entries(array_agg(
                struct(
                    c.column_name as key,
                    struct(
                        c.column_name as name,
                        UPPER(c.data_type) as scalarType,
                        c.is_nullable = 'YES' as nullable
                    ) as value
                )
            )) as columns,
            null as primary_keys
        FROM information_schema.tables t
        JOIN information_schema.columns c
            ON t.table_catalog = c.table_catalog
            AND t.table_schema = c.table_schema
            AND t.table_name = c.table_name
        {where_clause}
        GROUP BY t.table_catalog, t.table_schema, t.table_name, t.table_type
    )
    SELECT to_json(
        map_from_entries(
            array_agg(
                struct(
                    CONCAT(table_schema, '.', table_name) as key,
                    struct(
                        table_catalog as physicalCatalog,
                        table_schema as physicalSchema,
                        '' as catalog,
                        table_schema as schema,
                        table_name as name,
                        columns as columns,
                        primary_keys as primaryKeys,
                        array() as exportedKeys
                    ) as value
                )
            )
        )
    ) as tables
    FROM column_info",
        where_clause = filter.where_clause()
    )
}

/// Flat table listing used by client-side shaping.
///
/// Result columns: `table_catalog, table_schema, table_name, table_type`.
pub fn build_table_listing_query(filter: &IntrospectionFilter) -> String {
    format!(
        "
    SELECT t.table_catalog, t.table_schema, t.table_name, t.table_type
    FROM information_schema.tables t
    {}
    ORDER BY t.table_catalog, t.table_schema, t.table_name",
        filter.where_clause()
    )
}

/// Flat column listing used by client-side shaping.
///
/// Result columns: `table_catalog, table_schema, table_name, column_name,
/// data_type, is_nullable`. Aliased as `t` so the shared filter clause
/// applies unchanged.
pub fn build_column_listing_query(filter: &IntrospectionFilter) -> String {
    format!(
        "
    SELECT t.table_catalog, t.table_schema, t.table_name,
           t.column_name, t.data_type, t.is_nullable
    FROM information_schema.columns t
    {}
    ORDER BY t.table_catalog, t.table_schema, t.table_name, t.ordinal_position",
        filter.where_clause()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(catalog: &str, schema: &str) -> IntrospectionFilter {
        IntrospectionFilter::new(Some(catalog.to_string()), Some(schema.to_string()))
    }

    #[test]
    fn test_filter_composition_matrix() {
        let cases = [
            ("", "", false, false),
            ("prod", "", true, false),
            ("", "sales", false, true),
            ("prod", "sales", true, true),
        ];

        for (catalog, schema, expect_catalog, expect_schema) in cases {
            let query = build_introspection_query(&filter(catalog, schema));

            assert_eq!(
                query.contains("t.table_catalog = '"),
                expect_catalog,
                "catalog={catalog:?} schema={schema:?}"
            );
            assert_eq!(
                query.contains("t.table_schema = '"),
                expect_schema,
                "catalog={catalog:?} schema={schema:?}"
            );
            if expect_catalog {
                assert!(query.contains(&format!("AND t.table_catalog = '{catalog}'")));
            }
            if expect_schema {
                assert!(query.contains(&format!("AND t.table_schema = '{schema}'")));
            }
        }
    }

    #[test]
    fn test_catalog_only_filter() {
        let query = build_introspection_query(&filter("prod", ""));
        assert!(query.contains("t.table_catalog = 'prod'"));
        assert!(!query.contains("t.table_schema = '"));
    }

    #[test]
    fn test_information_schema_always_excluded() {
        for (catalog, schema) in [("", ""), ("prod", ""), ("", "sales"), ("prod", "sales")] {
            let f = filter(catalog, schema);
            for query in [
                build_introspection_query(&f),
                build_table_listing_query(&f),
                build_column_listing_query(&f),
            ] {
                assert!(query.contains("t.table_schema != 'information_schema'"));
            }
        }
    }

    #[test]
    fn test_filters_follow_exclusion_inside_where() {
        let query = build_introspection_query(&filter("prod", "sales"));
        let exclusion = query.find("!= 'information_schema'").unwrap();
        let catalog = query.find("t.table_catalog = 'prod'").unwrap();
        let schema = query.find("t.table_schema = 'sales'").unwrap();
        let group_by = query.find("GROUP BY").unwrap();

        assert!(exclusion < catalog && catalog < schema && schema < group_by);
    }

    #[test]
    fn test_document_shape_in_query() {
        let query = build_introspection_query(&IntrospectionFilter::default());

        assert!(query.contains("JOIN information_schema.columns c"));
        assert!(query.contains("UPPER(c.data_type) as scalarType"));
        assert!(query.contains("c.is_nullable = 'YES' as nullable"));
        assert!(query.contains("CONCAT(table_schema, '.', table_name) as key"));
        assert!(query.contains("'' as catalog"));
        assert!(query.contains("primary_keys as primaryKeys"));
        assert!(query.contains("array() as exportedKeys"));
        assert!(query.contains(
            "GROUP BY t.table_catalog, t.table_schema, t.table_name, t.table_type"
        ));
        assert!(query.trim_end().ends_with("FROM column_info"));
    }

    #[test]
    fn test_empty_string_is_no_filter() {
        let f = IntrospectionFilter::new(Some(String::new()), Some(String::new()));
        assert_eq!(f, IntrospectionFilter::default());
        assert!(f.catalog().is_none());
        assert!(f.schema().is_none());
    }

    #[test]
    fn test_filter_values_are_spliced_verbatim_without_escaping() {
        // Known limitation kept on purpose: a quote in a filter value ends
        // the SQL literal early. The value reaches the statement unchanged.
        let query = build_introspection_query(&filter("o'brien", "x' OR '1'='1"));
        assert!(query.contains("AND t.table_catalog = 'o'brien'"));
        assert!(query.contains("AND t.table_schema = 'x' OR '1'='1'"));
    }

    #[test]
    fn test_filters_are_exact_match_not_patterns() {
        let query = build_introspection_query(&filter("prod%", "sa_es"));
        assert!(query.contains("t.table_catalog = 'prod%'"));
        assert!(!query.contains("LIKE"));
    }

    #[test]
    fn test_listing_queries_apply_filters() {
        let f = filter("prod", "sales");
        let tables = build_table_listing_query(&f);
        let columns = build_column_listing_query(&f);

        for query in [&tables, &columns] {
            assert!(query.contains("AND t.table_catalog = 'prod'"));
            assert!(query.contains("AND t.table_schema = 'sales'"));
        }
        assert!(tables.contains("FROM information_schema.tables t"));
        assert!(columns.contains("FROM information_schema.columns t"));
        assert!(columns.contains("ordinal_position"));
    }
}
