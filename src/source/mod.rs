//! Source adapters for the eight external bibliographic registries this
//! crate cross-checks entries against.
pub mod arxiv;
pub mod crossref;
pub mod datacite;
pub mod dblp;
pub mod openalex;
pub mod pubmed;
pub mod semantic_scholar;
pub mod zenodo;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source's native response, keyed by the source's own field names; the
/// Field Comparator owns the mapping from these keys to canonical fields.
pub type SourceRecord = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    Crossref,
    Arxiv,
    Zenodo,
    Dblp,
    Datacite,
    Pubmed,
    SemanticScholar,
    Openalex,
}

impl SourceName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crossref => "crossref",
            Self::Arxiv => "arxiv",
            Self::Zenodo => "zenodo",
            Self::Dblp => "dblp",
            Self::Datacite => "datacite",
            Self::Pubmed => "pubmed",
            Self::SemanticScholar => "semantic_scholar",
            Self::Openalex => "openalex",
        }
    }
}

impl std::fmt::Display for SourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority order, high to low.
pub const PRIORITY_ORDER: &[SourceName] = &[
    SourceName::Crossref,
    SourceName::Arxiv,
    SourceName::Zenodo,
    SourceName::Dblp,
    SourceName::Datacite,
    SourceName::Pubmed,
    SourceName::SemanticScholar,
    SourceName::Openalex,
];

pub(crate) fn str_value(value: &str) -> Value {
    Value::String(value.to_owned())
}

/// Read a string-valued field out of a source's raw record, if present.
pub fn str_field(record: &SourceRecord, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_owned)
}
