//! Library module for dbxschema-collect
//!
//! Exposes the CLI definition and the collection pipeline so integration
//! tests can drive them without spawning the binary.

pub mod collect;
pub mod output;

use clap::{Args, Parser, ValueEnum};
use dbxschema_core::{IntrospectionFilter, error::redact_dsn};
use std::fmt;
use std::path::PathBuf;

pub use collect::{collect, initialize, introspect, load_dsn, run};
pub use output::OutputTarget;

/// CLI argument structure
#[derive(Parser)]
#[command(name = "dbxschema-collect")]
#[command(about = "Databricks table introspection for data connectors")]
#[command(version)]
#[command(long_about = "
dbxschema-collect - Databricks catalog introspection

Reads information_schema metadata from a Databricks SQL warehouse and emits
one JSON document keyed by \"<schema>.<table>\", listing each table's
columns with their upper-cased types and nullability.

CONNECTION:
  The connection string is read from the DATABRICKS_DSN environment variable:
  token:<personal-access-token>@<host>:443/sql/1.0/warehouses/<warehouse-id>

EXAMPLES:
  dbxschema-collect
  dbxschema-collect --catalog main --schema sales --output /data/tables.json
  dbxschema-collect --shaping client --skip-diagnostics
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Databricks connection string
    #[arg(
        long,
        env = "DATABRICKS_DSN",
        hide_env_values = true,
        value_name = "DSN",
        help = "Databricks connection string (prefer the environment variable)"
    )]
    pub dsn: Option<String>,

    /// Catalog filter
    #[arg(long, help = "Optional: Specific catalog to introspect")]
    pub catalog: Option<String>,

    /// Schema filter
    #[arg(long, help = "Optional: Specific schema to introspect")]
    pub schema: Option<String>,

    /// Output file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Optional: Output JSON file path (standard output if omitted)"
    )]
    pub output: Option<PathBuf>,

    /// Where the document is shaped
    #[arg(
        long,
        value_enum,
        default_value_t = Shaping::Warehouse,
        help = "Build the document inside the warehouse query or from flat listings"
    )]
    pub shaping: Shaping,

    /// Skip the access listings
    #[arg(long, help = "Do not list accessible catalogs, schemas and tables first")]
    pub skip_diagnostics: bool,
}

/// Verbosity flags shared with the rest of the toolchain.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all log output except errors")]
    pub quiet: bool,
}

/// Where the introspection document is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shaping {
    /// One aggregate query; the warehouse returns the JSON text
    Warehouse,
    /// Flat table and column listings joined locally
    Client,
}

/// Resolved run settings.
#[derive(Clone)]
pub struct Settings {
    pub dsn: Option<String>,
    pub filter: IntrospectionFilter,
    pub output: OutputTarget,
    pub shaping: Shaping,
    pub diagnostics: bool,
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            dsn: cli.dsn.clone(),
            filter: IntrospectionFilter::new(cli.catalog.clone(), cli.schema.clone()),
            output: cli
                .output
                .clone()
                .map_or(OutputTarget::Stdout, OutputTarget::File),
            shaping: cli.shaping,
            diagnostics: !cli.skip_diagnostics,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("dsn", &self.dsn.as_deref().map(redact_dsn))
            .field("filter", &self.filter)
            .field("output", &self.output)
            .field("shaping", &self.shaping)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}
