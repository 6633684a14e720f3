use thiserror::Error;

/// Errors raised while constructing or mutating [`crate::entry::Entry`] field data.
#[derive(Error, Debug, PartialEq)]
pub enum RecordDataError {
    #[error("Field name is empty")]
    EmptyFieldName,
    #[error("Field name '{0}' is not a lowercase ASCII identifier")]
    FieldNameNotAsciiLowercase(String),
    #[error("Citation key is empty")]
    EmptyCitekey,
}
