//! Databricks table introspection tool.
//!
//! Connects to a SQL warehouse using `DATABRICKS_DSN`, reads
//! `information_schema` and writes one JSON document describing every
//! visible table.
//!
//! # Security Guarantees
//! - Read-only statements only
//! - The access token is never logged
//! - Logs and diagnostics go to stderr; stdout carries only the document

use clap::Parser;
use dbxschema_collect::{Cli, run};
use dbxschema_core::init_logging;
use std::error::Error as _;
use std::process::ExitCode;
use tracing::{debug, error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                debug!("caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
