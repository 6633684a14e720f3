use thiserror::Error;

use super::RecordDataError;

/// Errors arising while parsing or serializing the textual BibTeX form.
///
/// Parsing itself is delegated to `serde_bibtex`; this type only wraps
/// its failure modes together with the validation performed while
/// lifting a raw entry into [`crate::entry::Entry`].
#[derive(Error, Debug)]
pub enum BibtexDataError {
    #[error("Invalid record data: {0}")]
    InvalidData(#[from] RecordDataError),
    #[error("Unknown entry type: '{0}'")]
    UnknownEntryType(String),
    #[error("BibTeX entry is missing a citation key")]
    MissingCitekey,
    #[error("BibTeX string could not be parsed: {0}")]
    BibtexParseError(String),
    #[error("BibTeX string contained more than one entry")]
    BibtexMultipleEntries,
    #[error("BibTeX string was empty")]
    Empty,
}
