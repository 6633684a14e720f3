use thiserror::Error;

/// A violation of the Record Store's citation-key uniqueness invariant.
#[derive(Error, Debug)]
pub enum CitekeyError {
    #[error("citation key is empty")]
    Empty,
    #[error("citation key '{0}' is already present in the record store")]
    Duplicate(String),
    #[error("citation key '{0}' is not present in the record store")]
    Missing(String),
}
