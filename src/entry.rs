//! The canonical entry type and the closed schema of BibTeX entry types.
use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_bibtex::{de::Deserializer, to_string_unchecked};

use crate::error::BibtexDataError;

/// The closed set of entry types this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Article,
    Book,
    Inproceedings,
    Proceedings,
    Incollection,
    Inbook,
    Techreport,
    Manual,
    Mastersthesis,
    Phdthesis,
    Booklet,
    Unpublished,
    Misc,
}

impl EntryType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::Inproceedings => "inproceedings",
            Self::Proceedings => "proceedings",
            Self::Incollection => "incollection",
            Self::Inbook => "inbook",
            Self::Techreport => "techreport",
            Self::Manual => "manual",
            Self::Mastersthesis => "mastersthesis",
            Self::Phdthesis => "phdthesis",
            Self::Booklet => "booklet",
            Self::Unpublished => "unpublished",
            Self::Misc => "misc",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = BibtexDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "article" => Self::Article,
            "book" => Self::Book,
            "inproceedings" | "conference" => Self::Inproceedings,
            "proceedings" => Self::Proceedings,
            "incollection" => Self::Incollection,
            "inbook" => Self::Inbook,
            "techreport" | "report" => Self::Techreport,
            "manual" => Self::Manual,
            "mastersthesis" => Self::Mastersthesis,
            "phdthesis" => Self::Phdthesis,
            "booklet" => Self::Booklet,
            "unpublished" => Self::Unpublished,
            "misc" | "online" => Self::Misc,
            other => return Err(BibtexDataError::UnknownEntryType(other.to_owned())),
        })
    }
}

/// Canonical field order used when writing an entry back out.
pub const CANONICAL_FIELD_ORDER: &[&str] = &[
    "entrytype",
    "title",
    "author",
    "year",
    "journal",
    "booktitle",
    "volume",
    "number",
    "pages",
    "publisher",
    "doi",
    "issn",
    "url",
    "eprint",
    "eprinttype",
    "abstract",
];

/// A single bibliography record: a closed entry type, a unique citation key,
/// and a flat map of lowercase-ASCII field names to free-text values.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub entry_type: EntryType,
    pub citekey: String,
    pub fields: BTreeMap<String, String>,
}

/// Wire shape deserialized directly by `serde_bibtex`; `Entry` validates and
/// wraps it. Kept separate so that a malformed entry type or citekey failure
/// carries a dedicated [`BibtexDataError`] variant instead of a raw `serde`
/// error.
#[derive(Debug, Deserialize)]
struct RawEntry {
    entry_type: String,
    citation_key: String,
    fields: BTreeMap<String, String>,
}

impl TryFrom<RawEntry> for Entry {
    type Error = BibtexDataError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        if raw.citation_key.is_empty() {
            return Err(BibtexDataError::MissingCitekey);
        }
        let entry_type = raw.entry_type.parse()?;
        Ok(Entry {
            entry_type,
            citekey: raw.citation_key,
            fields: raw.fields,
        })
    }
}

impl Entry {
    pub fn new(entry_type: EntryType, citekey: impl Into<String>) -> Self {
        Self {
            entry_type,
            citekey: citekey.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Fields in canonical order, followed by any remaining
    /// allowed fields in alphabetical order. Fields outside
    /// [`allowed_fields`] are dropped.
    pub fn ordered_fields(&self) -> Vec<(&str, &str)> {
        let allowed = allowed_fields(self.entry_type);
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::with_capacity(self.fields.len());
        for &name in CANONICAL_FIELD_ORDER {
            if allowed.contains(name)
                && let Some(value) = self.fields.get(name)
            {
                out.push((name, value.as_str()));
                seen.insert(name);
            }
        }
        for (name, value) in &self.fields {
            if allowed.contains(name.as_str()) && !seen.contains(name.as_str()) {
                out.push((name.as_str(), value.as_str()));
            }
        }
        out
    }
}

/// The set of field names this entry type may carry on commit.
/// Per-type sets follow the standard BibTeX field-per-entry-type convention;
/// every type also accepts the identifier/provenance fields this crate
/// itself tracks (`doi`, `eprint`, `eprinttype`, `issn`, `url`, `pmid`,
/// `pubmed`, `abstract`) regardless of whether classic BibTeX allows them.
pub fn allowed_fields(entry_type: EntryType) -> std::collections::HashSet<&'static str> {
    // A Zenodo/DataCite `misc` record carries `publisher` even though
    // classic BibTeX doesn't define that field for `@misc`, so it is
    // tracked universally alongside the identifiers.
    const TRACKED_IDENTIFIERS: &[&str] = &[
        "doi", "eprint", "eprinttype", "issn", "url", "pmid", "pubmed", "abstract", "note",
        "publisher",
    ];

    use EntryType::*;
    let per_type: &[&str] = match entry_type {
        Article => &["author", "title", "journal", "year", "volume", "number", "pages", "month"],
        Inproceedings => &[
            "author", "title", "booktitle", "year", "editor", "volume", "number", "series",
            "pages", "address", "month", "organization", "publisher",
        ],
        Book => &[
            "author", "editor", "title", "publisher", "year", "volume", "number", "series",
            "address", "edition", "month",
        ],
        Inbook => &[
            "author", "editor", "title", "chapter", "pages", "publisher", "year", "volume",
            "number", "series", "type", "address", "edition", "month",
        ],
        Incollection => &[
            "author", "title", "booktitle", "publisher", "year", "editor", "volume", "number",
            "series", "type", "chapter", "pages", "address", "edition", "month",
        ],
        Proceedings => &[
            "title", "year", "editor", "volume", "number", "series", "address", "month",
            "organization", "publisher",
        ],
        Techreport => &["author", "title", "institution", "year", "type", "number", "address", "month"],
        Mastersthesis | Phdthesis => &["author", "title", "school", "year", "type", "address", "month"],
        Manual => &["title", "author", "organization", "address", "edition", "month", "year"],
        Booklet => &["title", "author", "howpublished", "address", "month", "year"],
        Unpublished => &["author", "title", "note", "month", "year"],
        Misc => &["title", "author", "howpublished", "month", "year", "journal", "booktitle"],
    };

    per_type.iter().chain(TRACKED_IDENTIFIERS).copied().collect()
}

pub fn entries_from_bibtex(
    bibtex: &[u8],
) -> impl Iterator<Item = Result<Entry, BibtexDataError>> + use<'_> {
    Deserializer::from_slice(bibtex)
        .into_iter_regular_entry::<RawEntry>()
        .map(|res| {
            res.map_err(|err| BibtexDataError::BibtexParseError(err.to_string()))
                .and_then(Entry::try_from)
        })
}

impl FromStr for Entry {
    type Err = BibtexDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut de_iter = Deserializer::from_str(s).into_iter_regular_entry::<RawEntry>();

        match de_iter.next() {
            Some(Ok(raw)) => {
                if de_iter.next().is_none() {
                    Entry::try_from(raw)
                } else {
                    Err(Self::Err::BibtexMultipleEntries)
                }
            }
            Some(Err(err)) => Err(Self::Err::BibtexParseError(err.to_string())),
            None => Err(Self::Err::Empty),
        }
    }
}

struct EntryFieldSeq<'a>(&'a Entry);

impl Serialize for EntryFieldSeq<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut state = serializer.serialize_seq(None)?;
        for (key, value) in self.0.ordered_fields() {
            state.serialize_element(&(key, value))?;
        }
        state.end()
    }
}

impl Serialize for Entry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Entry", 3)?;
        state.serialize_field("entry_type", self.entry_type.as_str())?;
        state.serialize_field("entry_key", &self.citekey)?;
        state.serialize_field("fields", &EntryFieldSeq(self))?;
        state.end()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: `entry_type` is drawn from the closed `EntryType` enum and
        // field names are validated lowercase ASCII identifiers, both of
        // which satisfy the `serde_bibtex` syntax requirements.
        let buffer = to_string_unchecked(&[self]).expect("serialization should not fail");
        f.write_str(&buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_entry() {
        let src = "@article{key1, title = {A Title}, year = {2020}}";
        let entry: Entry = src.parse().unwrap();
        assert_eq!(entry.entry_type, EntryType::Article);
        assert_eq!(entry.citekey, "key1");
        assert_eq!(entry.field("title"), Some("A Title"));
    }

    #[test]
    fn rejects_multiple_entries() {
        let src = "@article{a, title={X}}\n@article{b, title={Y}}";
        assert!(matches!(
            src.parse::<Entry>(),
            Err(BibtexDataError::BibtexMultipleEntries)
        ));
    }

    #[test]
    fn ordered_fields_puts_canonical_first() {
        let mut e = Entry::new(EntryType::Article, "k");
        // "month" is allowed for `article` but outside `CANONICAL_FIELD_ORDER`.
        e.set_field("month", "1");
        e.set_field("title", "T");
        e.set_field("author", "A");
        let ordered = e.ordered_fields();
        assert_eq!(ordered[0].0, "title");
        assert_eq!(ordered[1].0, "author");
        assert_eq!(ordered.last().unwrap().0, "month");
    }

    #[test]
    fn ordered_fields_drops_fields_outside_the_entry_types_allowed_set() {
        let mut e = Entry::new(EntryType::Article, "k");
        e.set_field("title", "T");
        e.set_field("school", "a thesis-only field");
        let ordered = e.ordered_fields();
        assert!(!ordered.iter().any(|(name, _)| *name == "school"));
    }
}
