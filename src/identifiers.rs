//! The Identifier Extractor: a pure function pulling DOI/arXiv/PMID out of a
//! canonical entry.
use std::sync::LazyLock;

use regex::Regex;

use crate::entry::Entry;

static ARXIV_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)arxiv:\s*(\d{4}\.\d{4,5}(?:v\d+)?)").unwrap());
static ARXIV_DOI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)10\.48550/arxiv\.(\d{4}\.\d{4,5})").unwrap());
static ARXIV_EPRINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}\.\d{4,5})(?:v\d+)?").unwrap());
static ARXIV_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)arxiv\.org/abs/(\d{4}\.\d{4,5})(?:v\d+)?").unwrap());

fn strip_version_suffix(id: &str) -> String {
    match id.find('v') {
        Some(pos) if id[pos + 1..].chars().all(|c| c.is_ascii_digit()) && pos + 1 < id.len() => {
            id[..pos].to_owned()
        }
        _ => id.to_owned(),
    }
}

/// Extracted identifiers for one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiers {
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
    pub pmid: Option<String>,
}

/// Pull an arXiv identifier out of an arbitrary DOI string, e.g. one
/// discovered in a source's own record rather than the entry itself.
pub fn arxiv_id_from_doi(doi: &str) -> Option<String> {
    ARXIV_DOI_RE
        .captures(doi)
        .map(|caps| strip_version_suffix(&caps[1]))
}

/// Scan an arbitrary string (a source's `arxiv_id`/`eprint` field, or a
/// DOI/URL it reported) for an arXiv identifier, trying the DOI and URL
/// patterns before the bare `YYYY.NNNNN` pattern.
pub fn arxiv_id_from_text(text: &str) -> Option<String> {
    ARXIV_DOI_RE
        .captures(text)
        .or_else(|| ARXIV_URL_RE.captures(text))
        .or_else(|| ARXIV_EPRINT_RE.captures(text))
        .map(|caps| strip_version_suffix(&caps[1]))
}

/// Extract `(doi, arxiv_id, pmid)` from a canonical entry.
pub fn extract(entry: &Entry) -> Identifiers {
    let doi = entry
        .field("doi")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    let arxiv_id = entry
        .field("note")
        .and_then(|note| ARXIV_NOTE_RE.captures(note))
        .or_else(|| doi.as_deref().and_then(|d| ARXIV_DOI_RE.captures(d)))
        .or_else(|| {
            entry
                .field("eprint")
                .and_then(|e| ARXIV_EPRINT_RE.captures(e))
        })
        .map(|caps| strip_version_suffix(&caps[1]));

    let pmid = entry
        .field("pmid")
        .or_else(|| entry.field("pubmed"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    Identifiers {
        doi,
        arxiv_id,
        pmid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    #[test]
    fn extracts_doi() {
        let mut e = Entry::new(EntryType::Article, "k");
        e.set_field("doi", "10.1000/abc");
        assert_eq!(extract(&e).doi.as_deref(), Some("10.1000/abc"));
    }

    #[test]
    fn extracts_arxiv_from_note() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("note", "arXiv:2301.00001v2");
        assert_eq!(extract(&e).arxiv_id.as_deref(), Some("2301.00001"));
    }

    #[test]
    fn extracts_arxiv_from_doi() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("doi", "10.48550/ARXIV.2301.00001");
        assert_eq!(extract(&e).arxiv_id.as_deref(), Some("2301.00001"));
    }

    #[test]
    fn extracts_arxiv_from_eprint() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("eprint", "2301.00001");
        assert_eq!(extract(&e).arxiv_id.as_deref(), Some("2301.00001"));
    }

    #[test]
    fn extracts_pmid() {
        let mut e = Entry::new(EntryType::Article, "k");
        e.set_field("pmid", "12345678");
        assert_eq!(extract(&e).pmid.as_deref(), Some("12345678"));
    }
}
