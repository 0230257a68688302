use std::io;
use thiserror::Error;

/// Errors produced by the conversion pipeline.
///
/// `MalformedInput` and `SchemaMismatch` are always fatal. `DataIntegrity`
/// is fatal only when no safe repair exists; repairable defects (one-sided
/// adjacency) are logged and fixed in place instead of being raised.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("feed record counts disagree: attribute feed has {attributes} cells, geometry feed has {geometry}")]
    SchemaMismatch { attributes: usize, geometry: usize },

    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
