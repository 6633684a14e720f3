//! # Error implementation
//! The main error types which result from normal usage.
mod bibtex;
mod database;
mod provider;
mod record;
mod record_data;
mod session;

use thiserror::Error;

pub use self::{
    bibtex::BibtexDataError, database::StoreError, provider::ProviderError, record::CitekeyError,
    record_data::RecordDataError, session::SessionError,
};

/// A trait for errors which have a representation which only depends on the variant, and not on
/// particular data associated with the error.
pub trait ShortError {
    /// Represent an error in short form.
    fn short_err(&self) -> &'static str;
}

impl ShortError for ProviderError {
    fn short_err(&self) -> &'static str {
        match self {
            Self::NetworkFailure(_) => "network failure",
            Self::Timeout => "timeout",
            Self::UnexpectedStatusCode(_) => "unexpected status",
            Self::MalformedResponse(_) => "malformed response",
            Self::Format(_) => "incompatible format",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bibliography error: {0}")]
    Bibtex(#[from] BibtexDataError),
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
    #[error("Source adapter error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}
