//! Collection workflow: connect, list access, fetch the document, emit it.

use dbxschema_core::{
    DatabricksConnection, DatabricksDsn, Result, StatementExecutor,
    diagnostics::debug_table_access,
    introspect::{assemble_document, fetch_document_json},
};
use tracing::info;

use crate::output;
use crate::{Cli, Settings, Shaping};

/// Parses the DSN taken from `--dsn` or `DATABRICKS_DSN`.
///
/// # Errors
/// Returns a configuration error when the DSN is missing, empty or invalid.
pub fn load_dsn(settings: &Settings) -> Result<DatabricksDsn> {
    DatabricksDsn::parse(settings.dsn.as_deref().unwrap_or_default())
}

/// Parses the DSN and opens a verified connection.
///
/// # Errors
/// Returns a configuration error for a missing or invalid DSN, or a
/// connection error when the warehouse cannot be reached.
pub async fn initialize(settings: &Settings) -> Result<DatabricksConnection> {
    let dsn = load_dsn(settings)?;
    DatabricksConnection::connect(&dsn).await
}

/// Runs the whole tool for the parsed command line.
///
/// The connection is released whether collection succeeds or not.
///
/// # Errors
/// Returns the first fatal error; see [`collect`].
pub async fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::from(cli);
    let connection = initialize(&settings).await?;

    let outcome = collect(&connection, &settings).await;
    connection.close();
    outcome
}

/// Prints the access report (unless disabled) to stderr, then fetches and
/// emits the document.
///
/// Nothing is written to the output target unless the document was fetched
/// and formatted successfully.
///
/// # Errors
/// Returns a query execution, formatting or output error.
pub async fn collect(executor: &dyn StatementExecutor, settings: &Settings) -> Result<()> {
    if settings.diagnostics {
        let report = debug_table_access(executor).await;
        eprint!("{}", report);
    }

    let document = introspect(executor, settings).await?;
    output::emit(&document, &settings.output).await
}

/// Fetches the document and returns it indented with two spaces.
///
/// # Errors
/// Returns a query execution error if the statements fail, or a formatting
/// error if the warehouse's JSON cannot be parsed.
pub async fn introspect(executor: &dyn StatementExecutor, settings: &Settings) -> Result<String> {
    info!("Starting table introspection...");

    match settings.shaping {
        Shaping::Warehouse => {
            let raw = fetch_document_json(executor, &settings.filter).await?;
            output::pretty_print(&raw)
        }
        Shaping::Client => {
            let document = assemble_document(executor, &settings.filter).await?;
            info!("Found {} tables", document.len());
            document.to_pretty_json()
        }
    }
}
