use thiserror::Error;

use super::StoreError;

/// Errors raised while applying an accept/reject/restore decision.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no pending validation result for entry '{0}'")]
    UnknownEntry(String),
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}
