//! The Field Comparator: classifies one source's contribution to a single
//! canonical field against the local value.
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::entry::{Entry, EntryType};
use crate::source::{SourceName, SourceRecord};

static HTML_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
];

/// Normalize a field value for comparison purposes.
/// LaTex markup is preserved on the canonical entry itself; this function
/// only affects the value used to decide which classification a field falls
/// into.
pub fn normalize_string(value: &str, field_name: &str) -> String {
    let mut out = value.replace(['{', '}'], "");
    for escape in ["\\&", "\\%", "\\$", "\\#"] {
        out = out.replace(escape, &escape[1..]);
    }
    for (entity, replacement) in HTML_ENTITIES {
        out = out.replace(entity, replacement);
    }
    out = out.trim().to_owned();

    match field_name {
        "title" | "author" | "journal" | "doi" | "entrytype" => out.to_ascii_lowercase(),
        "issn" => out
            .split(',')
            .next()
            .unwrap_or("")
            .replace('-', "")
            .to_ascii_lowercase(),
        _ => out,
    }
}

/// Jaccard character similarity: `|A∩B| / |A∪B|` over the set of characters
/// in each (normalized) string.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldClassification {
    Missing(String),
    Identical(String),
    NearDifference(String, String),
    Conflict(String, String),
}

/// The per-source comparison result for one entry: four maps plus a
/// per-field winning-source tag (trivially `source` for every key here; the
/// Priority Merger is what actually picks winners across sources).
#[derive(Debug, Default, Clone)]
pub struct Comparison {
    pub updated: BTreeMap<String, String>,
    pub conflicts: BTreeMap<String, (String, String)>,
    pub identical: BTreeMap<String, String>,
    pub different: BTreeMap<String, (String, String)>,
}

impl Comparison {
    pub fn classification_of(&self, field: &str) -> Option<FieldClassification> {
        if let Some(api) = self.updated.get(field) {
            return Some(FieldClassification::Missing(api.clone()));
        }
        if let Some(local) = self.identical.get(field) {
            return Some(FieldClassification::Identical(local.clone()));
        }
        if let Some((local, api)) = self.different.get(field) {
            return Some(FieldClassification::NearDifference(
                local.clone(),
                api.clone(),
            ));
        }
        if let Some((local, api)) = self.conflicts.get(field) {
            return Some(FieldClassification::Conflict(local.clone(), api.clone()));
        }
        None
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.updated
            .keys()
            .chain(self.identical.keys())
            .chain(self.different.keys())
            .chain(self.conflicts.keys())
            .map(String::as_str)
    }
}

fn value_as_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_as_str)
                .collect::<Vec<_>>()
                .join(" and "),
        ),
        _ => None,
    }
}

/// Map a source's native publication-type string onto the BibTeX entry type
/// it denotes, so `entrytype` comparison isn't done against the source's own
/// vocabulary. Types with no sensible BibTeX counterpart are left unmapped,
/// which drops the `entrytype` pseudo-field for that source rather than
/// manufacturing a spurious conflict.
fn map_native_entrytype(source: SourceName, native: &str) -> Option<EntryType> {
    match source {
        SourceName::Crossref => match native {
            "journal-article" => Some(EntryType::Article),
            "proceedings-article" => Some(EntryType::Inproceedings),
            "book-chapter" => Some(EntryType::Incollection),
            "book" | "monograph" => Some(EntryType::Book),
            "report" => Some(EntryType::Techreport),
            "dissertation" => Some(EntryType::Phdthesis),
            "proceedings" => Some(EntryType::Proceedings),
            _ => None,
        },
        SourceName::Openalex => match native {
            "article" | "journal-article" => Some(EntryType::Article),
            "proceedings-article" => Some(EntryType::Inproceedings),
            "book-chapter" => Some(EntryType::Incollection),
            "book" => Some(EntryType::Book),
            "report" => Some(EntryType::Techreport),
            "dissertation" => Some(EntryType::Phdthesis),
            _ => None,
        },
        SourceName::Dblp => match native {
            "Journal Articles" => Some(EntryType::Article),
            "Conference and Workshop Papers" => Some(EntryType::Inproceedings),
            "Parts in Books or Collections" => Some(EntryType::Incollection),
            "Books and Theses" => Some(EntryType::Book),
            "Editorship" => Some(EntryType::Proceedings),
            _ => None,
        },
        _ => None,
    }
}

/// Map a source's native record into `(canonical field, api value)` pairs,
/// applying each source's own field-mapping and value transformers.
pub fn canonical_fields(source: SourceName, record: &SourceRecord) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut put = |field: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            out.insert(field.to_owned(), value);
        }
    };

    match source {
        SourceName::Crossref => {
            put("title", record.get("title").and_then(value_as_str));
            put("author", record.get("author").and_then(value_as_str));
            put(
                "journal",
                record.get("container-title").and_then(value_as_str),
            );
            put("year", record.get("year").and_then(value_as_str));
            put("volume", record.get("volume").and_then(value_as_str));
            put("pages", record.get("page").and_then(value_as_str));
            put("doi", record.get("DOI").and_then(value_as_str));
            put("issn", record.get("ISSN").and_then(value_as_str));
            put(
                "entrytype",
                record
                    .get("type")
                    .and_then(value_as_str)
                    .and_then(|t| map_native_entrytype(source, &t))
                    .map(|et| et.as_str().to_owned()),
            );
        }
        SourceName::Arxiv => {
            put("title", record.get("title").and_then(value_as_str));
            put("author", record.get("authors").and_then(value_as_str));
            put("year", record.get("published").and_then(value_as_str));
            put("doi", record.get("doi").and_then(value_as_str));
            put(
                "eprint",
                record.get("arxiv_id").and_then(value_as_str),
            );
            put("eprinttype", record.get("eprinttype").and_then(value_as_str));
            put("journal", record.get("journal_ref").and_then(value_as_str));
        }
        SourceName::Openalex => {
            put("title", record.get("title").and_then(value_as_str));
            put("author", record.get("authorships").and_then(value_as_str));
            put(
                "year",
                record.get("publication_year").and_then(value_as_str),
            );
            put(
                "journal",
                record
                    .get("primary_location.source.display_name")
                    .and_then(value_as_str),
            );
            put("doi", record.get("doi").and_then(value_as_str));
            put("volume", record.get("biblio.volume").and_then(value_as_str));
            put("number", record.get("biblio.issue").and_then(value_as_str));
            put("pages", record.get("biblio.pages").and_then(value_as_str));
            put(
                "entrytype",
                record
                    .get("type")
                    .and_then(value_as_str)
                    .and_then(|t| map_native_entrytype(source, &t))
                    .map(|et| et.as_str().to_owned()),
            );
        }
        SourceName::Dblp => {
            put("title", record.get("title").and_then(value_as_str));
            put("author", record.get("authors").and_then(value_as_str));
            put("year", record.get("year").and_then(value_as_str));
            put("journal", record.get("venue").and_then(value_as_str));
            put(
                "entrytype",
                record
                    .get("type")
                    .and_then(value_as_str)
                    .and_then(|t| map_native_entrytype(source, &t))
                    .map(|et| et.as_str().to_owned()),
            );
        }
        SourceName::SemanticScholar => {
            put("title", record.get("title").and_then(value_as_str));
            put("author", record.get("authors").and_then(value_as_str));
            put("year", record.get("year").and_then(value_as_str));
            put("journal", record.get("venue").and_then(value_as_str));
            put("doi", record.get("doi").and_then(value_as_str));
        }
        SourceName::Pubmed => {
            put("title", record.get("ArticleTitle").and_then(value_as_str));
            put("author", record.get("Author").and_then(value_as_str));
            put("year", record.get("PubDate.Year").and_then(value_as_str));
            put("journal", record.get("Journal.Title").and_then(value_as_str));
        }
        SourceName::Datacite => {
            put("title", record.get("titles").and_then(value_as_str));
            put("author", record.get("creators").and_then(value_as_str));
            put("year", record.get("publicationYear").and_then(value_as_str));
            put("publisher", record.get("publisher").and_then(value_as_str));
            put("doi", record.get("doi").and_then(value_as_str));
        }
        SourceName::Zenodo => {
            put("title", record.get("title").and_then(value_as_str));
            put("author", record.get("creators").and_then(value_as_str));
            put(
                "year",
                record
                    .get("publication_date")
                    .and_then(value_as_str)
                    .and_then(|d| YEAR_RE.find(&d).map(|m| m.as_str().to_owned())),
            );
            put("publisher", record.get("publisher").and_then(value_as_str));
            put("doi", record.get("doi").and_then(value_as_str));
        }
    }

    out
}

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// Compare one source's contribution against the local canonical entry.
pub fn compare(entry: &Entry, source: SourceName, record: &SourceRecord) -> Comparison {
    let api_fields = canonical_fields(source, record);
    let mut comparison = Comparison::default();

    for (field, api_raw) in api_fields {
        if api_raw.is_empty() || api_raw == "[]" {
            continue;
        }

        let local_raw = if field == "entrytype" {
            entry.entry_type.as_str().to_owned()
        } else {
            entry.field(&field).unwrap_or("").to_owned()
        };

        if local_raw.is_empty() {
            comparison.updated.insert(field, api_raw);
            continue;
        }

        let local_norm = normalize_string(&local_raw, &field);
        let api_norm = normalize_string(&api_raw, &field);

        if local_norm == api_norm {
            comparison.identical.insert(field, local_raw);
            continue;
        }

        if field == "pages" {
            continue;
        }

        if local_norm.len() <= 3 || api_norm.len() <= 3 {
            continue;
        }

        if field == "title" || field == "author" {
            comparison.updated.insert(field, api_raw);
            continue;
        }

        if jaccard_similarity(&local_norm, &api_norm) > 0.7 {
            comparison.different.insert(field, (local_raw, api_raw));
        } else {
            comparison.conflicts.insert(field, (local_raw, api_raw));
        }
    }

    comparison
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;
    use serde_json::json;

    #[test]
    fn missing_field_becomes_updated() {
        let entry = Entry::new(EntryType::Article, "k");
        let mut record = SourceRecord::new();
        record.insert("title".to_owned(), json!("A Title"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert_eq!(comparison.updated.get("title"), Some(&"A Title".to_owned()));
    }

    #[test]
    fn identical_after_normalization() {
        let mut entry = Entry::new(EntryType::Article, "k");
        entry.set_field("title", "A Title");
        let mut record = SourceRecord::new();
        record.insert("title".to_owned(), json!("a title"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert!(comparison.identical.contains_key("title"));
    }

    #[test]
    fn pages_never_conflict() {
        let mut entry = Entry::new(EntryType::Article, "k");
        entry.set_field("pages", "100-110");
        let mut record = SourceRecord::new();
        record.insert("page".to_owned(), json!("105-115"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert!(!comparison.conflicts.contains_key("pages"));
        assert!(!comparison.different.contains_key("pages"));
    }

    #[test]
    fn title_always_updates_on_mismatch() {
        let mut entry = Entry::new(EntryType::Article, "k");
        entry.set_field("title", "Old Title Text");
        let mut record = SourceRecord::new();
        record.insert("title".to_owned(), json!("Totally Different Title"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert!(comparison.updated.contains_key("title"));
    }

    #[test]
    fn near_match_goes_to_different() {
        let mut entry = Entry::new(EntryType::Article, "k");
        entry.set_field("journal", "Journal of Testing");
        let mut record = SourceRecord::new();
        record.insert("container-title".to_owned(), json!("Journal of Test"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert!(comparison.different.contains_key("journal") || comparison.identical.contains_key("journal"));
    }

    #[test]
    fn short_values_are_skipped() {
        let mut entry = Entry::new(EntryType::Article, "k");
        entry.set_field("volume", "12");
        let mut record = SourceRecord::new();
        record.insert("volume".to_owned(), json!("13"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert!(comparison.fields().next().is_none());
    }

    #[test]
    fn crossref_journal_article_matches_local_article_type() {
        let entry = Entry::new(EntryType::Article, "k");
        let mut record = SourceRecord::new();
        record.insert("type".to_owned(), json!("journal-article"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert!(comparison.identical.contains_key("entrytype"));
        assert!(!comparison.conflicts.contains_key("entrytype"));
    }

    #[test]
    fn dblp_conference_type_matches_local_inproceedings() {
        let entry = Entry::new(EntryType::Inproceedings, "k");
        let mut record = SourceRecord::new();
        record.insert(
            "type".to_owned(),
            json!("Conference and Workshop Papers"),
        );
        let comparison = compare(&entry, SourceName::Dblp, &record);
        assert!(comparison.identical.contains_key("entrytype"));
    }

    #[test]
    fn unmapped_native_type_is_dropped_rather_than_compared() {
        let entry = Entry::new(EntryType::Article, "k");
        let mut record = SourceRecord::new();
        record.insert("type".to_owned(), json!("posted-content"));
        let comparison = compare(&entry, SourceName::Crossref, &record);
        assert!(comparison.fields().next().is_none());
    }
}
