use thiserror::Error;

use super::CitekeyError;

/// Errors raised while flushing the Record Store to disk.
///
/// These are returned to the caller of the session operation that
/// triggered the flush; the in-memory state is left untouched by the
/// caller (see [`crate::session::SessionState::accept`]).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("citation key error: {0}")]
    Citekey(#[from] CitekeyError),
    #[error("failed to read bibliography file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write bibliography file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse bibliography: {0}")]
    Parse(#[from] crate::error::BibtexDataError),
}
