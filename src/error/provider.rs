use reqwest::StatusCode;
use thiserror::Error;

use super::RecordDataError;

/// A recoverable failure from a single source adapter.
///
/// Every variant here is swallowed by the orchestrator and treated as
/// "no result"; none of them propagate to the enclosing
/// [`crate::merge::ValidationResult`].
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Unexpected status code: {0}")]
    UnexpectedStatusCode(StatusCode),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Incompatible data format: {0}")]
    Format(#[from] RecordDataError),
}
