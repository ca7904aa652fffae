//! Document output: re-indenting and writing to a file or standard output.

use dbxschema_core::{IntrospectError, Result};
use std::io::Write;
use std::path::PathBuf;

/// Destination of the introspection document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Print to standard output
    Stdout,
    /// Write (create or truncate) the file at this path
    File(PathBuf),
}

/// Re-indents compact JSON with two spaces.
///
/// Key order is kept as the warehouse produced it.
///
/// # Errors
/// Returns a formatting error if `raw` is not valid JSON.
pub fn pretty_print(raw: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| IntrospectError::formatting("warehouse returned malformed JSON", e))?;
    serde_json::to_string_pretty(&value)
        .map_err(|e| IntrospectError::formatting("failed to indent JSON", e))
}

/// Writes the document to `target`, using the process stdout for
/// [`OutputTarget::Stdout`].
///
/// # Errors
/// See [`write_document`].
pub async fn emit(document: &str, target: &OutputTarget) -> Result<()> {
    let mut stdout = std::io::stdout();
    write_document(document, target, &mut stdout).await
}

/// Writes the document to `target`.
///
/// A file receives the document with no trailing newline and nothing is
/// written to `stdout`. Otherwise the document and one newline go to
/// `stdout`.
///
/// # Errors
/// Returns an output error if the file or `stdout` cannot be written.
pub async fn write_document<W: Write>(
    document: &str,
    target: &OutputTarget,
    stdout: &mut W,
) -> Result<()> {
    match target {
        OutputTarget::File(path) => {
            tokio::fs::write(path, document)
                .await
                .map_err(|e| IntrospectError::output(format!("Failed to write to {}", path.display()), e))?;
            tracing::info!("Results written to {}", path.display());
        }
        OutputTarget::Stdout => {
            writeln!(stdout, "{}", document)
                .and_then(|()| stdout.flush())
                .map_err(|e| IntrospectError::output("Failed to write to standard output", e))?;
        }
    }
    Ok(())
}
