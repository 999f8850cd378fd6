use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the tools themselves, as opposed to I/O or CSV errors
/// bubbling up from the libraries underneath.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("missing input file")]
    MissingInput,
    #[error("Unknown charset '{0}'")]
    UnknownCharset(String),
    #[error("Charset '{0}' cannot be used for output; choose another with --charset-out")]
    UnencodableCharset(String),
    #[error("File exists '{}', will not overwrite.", .0.display())]
    OutputExists(PathBuf),
    #[error("Cell in row {row}, column {column} is {width} characters wide (limit {limit})")]
    CellTooWide {
        row: u64,
        column: usize,
        width: usize,
        limit: usize,
    },
}
