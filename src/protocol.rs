//! Wire shapes for the review-session protocol spoken by an external
//! front-end. No HTTP server lives in this crate; the
//! front-end that drives these shapes over the wire is out of scope
//! — this module only defines the serde-compatible DTOs.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::merge::ValidationResult;
use crate::source::SourceName;

/// One entry's review state, as sent to a front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryReview {
    pub entry_key: String,
    pub entry_type: String,
    pub fields_missing: Vec<String>,
    pub fields_updated: BTreeMap<String, String>,
    pub fields_conflict: BTreeMap<String, (String, String)>,
    pub fields_identical: BTreeMap<String, String>,
    pub fields_different: BTreeMap<String, (String, String)>,
    pub field_sources: BTreeMap<String, SourceName>,
    pub field_source_options: BTreeMap<String, Vec<SourceName>>,
    pub has_doi: bool,
    pub doi_valid: bool,
    pub has_arxiv: bool,
    pub arxiv_valid: bool,
}

impl From<&ValidationResult> for EntryReview {
    fn from(result: &ValidationResult) -> Self {
        Self {
            entry_key: result.entry_key.clone(),
            entry_type: result.entry_type.as_str().to_owned(),
            fields_missing: result.fields_missing.clone(),
            fields_updated: result.fields_updated.clone(),
            fields_conflict: result.fields_conflict.clone(),
            fields_identical: result.fields_identical.clone(),
            fields_different: result.fields_different.clone(),
            field_sources: result.field_sources.clone(),
            field_source_options: result.field_source_options.clone(),
            has_doi: result.has_doi,
            doi_valid: result.doi_valid,
            has_arxiv: result.has_arxiv,
            arxiv_valid: result.arxiv_valid,
        }
    }
}

/// A single per-field decision a front-end sends back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
    Restore,
}

/// A field-level command addressed to one entry's session: `restore({key,
/// field})`, and a one-field-at-a-time form of `accept`/`reject` that a
/// front-end can use instead of batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCommand {
    pub entry_key: String,
    pub field: String,
    pub decision: Decision,
}

/// `accept({key, fields, sources})`: a batch of fields to
/// accept for one entry, with an optional per-field source override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptCommand {
    pub entry_key: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceName>,
}

/// `reject({key, fields})`: a batch of fields to reject for
/// one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectCommand {
    pub entry_key: String,
    pub fields: Vec<String>,
}

/// `accept_all_global()`: takes no arguments — it applies to
/// every pending entry in the session, not a single one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AcceptAllCommand;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Entry, EntryType};

    #[test]
    fn entry_review_round_trips_through_json() {
        let entry = Entry::new(EntryType::Article, "k");
        let result = ValidationResult::new(entry);
        let review = EntryReview::from(&result);
        let json = serde_json::to_string(&review).unwrap();
        let back: EntryReview = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entry_key, "k");
    }

    #[test]
    fn accept_command_defaults_sources_when_omitted() {
        let json = r#"{"entry_key":"k","fields":["title","volume"]}"#;
        let cmd: AcceptCommand = serde_json::from_str(json).unwrap();
        assert!(cmd.sources.is_empty());
        assert_eq!(cmd.fields, vec!["title".to_owned(), "volume".to_owned()]);
    }

    #[test]
    fn decision_serializes_snake_case() {
        let json = serde_json::to_string(&Decision::Accept).unwrap();
        assert_eq!(json, "\"accept\"");
    }
}
