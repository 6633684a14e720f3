//! The Normalizer: lifts a raw parsed entry into canonical form.
use std::str::CharIndices;
use std::sync::LazyLock;

use regex::Regex;

use crate::entry::{Entry, EntryType};

static DOI_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://(dx\.)?doi\.org/(10\..+)$").unwrap());
static DATE_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// An arXiv-minted DOI, e.g. `10.48550/arXiv.2301.00001`.
pub fn is_arxiv_doi(doi: &str) -> bool {
    doi.to_ascii_lowercase().starts_with("10.48550/arxiv.")
}

/// A Zenodo-minted DOI.
pub fn is_zenodo_doi(doi: &str) -> bool {
    doi.starts_with("10.5281/")
}

/// Apply the Normalizer's transformations in order, mutating `entry` in place.
pub fn normalize(entry: &mut Entry) {
    alias_fields(entry);
    alias_type(entry);
    clean_identifiers(entry);
    promote_type(entry);
}

fn alias_fields(entry: &mut Entry) {
    for (from, to) in [("journaltitle", "journal"), ("location", "address")] {
        if !entry.fields.contains_key(to)
            && let Some(value) = entry.fields.remove(from)
        {
            entry.fields.insert(to.to_owned(), value);
        }
    }

    if !entry.fields.contains_key("year")
        && let Some(date) = entry.fields.remove("date")
        && let Some(m) = DATE_YEAR_RE.find(&date)
    {
        entry.fields.insert("year".to_owned(), m.as_str().to_owned());
    }
}

fn alias_type(entry: &mut Entry) {
    // Aliasing to EntryType variants not present in the closed set (`conference`,
    // `online`, `report`) is already folded into `EntryType::from_str`; nothing
    // further is required here once parsing has run.
    let _ = entry;
}

fn clean_identifiers(entry: &mut Entry) {
    if entry.fields.get("doi").is_none_or(String::is_empty)
        && let Some(url) = entry.fields.get("url")
        && let Some(caps) = DOI_URL_RE.captures(url)
    {
        let doi = caps[2].to_owned();
        entry.fields.insert("doi".to_owned(), doi);
        entry.fields.remove("url");
    }

    if let Some(doi) = entry.fields.get_mut("doi") {
        let mut cleaned = doi.as_str();
        for prefix in ["https://doi.org/", "http://doi.org/", "doi:"] {
            if let Some(rest) = cleaned.strip_prefix(prefix) {
                cleaned = rest;
                break;
            }
        }
        let cleaned = cleaned.trim_end_matches(['.', ',']).to_owned();
        *doi = cleaned;
    }

    let doi = entry.fields.get("doi").cloned();
    if let Some(doi) = doi
        && let Some(url) = entry.fields.get("url")
        && let Some(caps) = DOI_URL_RE.captures(url)
        && caps[2].eq_ignore_ascii_case(&doi)
    {
        entry.fields.remove("url");
    }
}

fn promote_type(entry: &mut Entry) {
    if entry.entry_type != EntryType::Misc {
        return;
    }

    let title_has_proceedings = entry
        .field("title")
        .is_some_and(|t| t.to_ascii_lowercase().contains("proceedings"));
    let has_editor = entry.field("editor").is_some();
    let has_author = entry.field("author").is_some();

    if title_has_proceedings && has_editor && !has_author {
        entry.entry_type = EntryType::Proceedings;
        return;
    }

    if entry.field("booktitle").is_some() {
        entry.entry_type = EntryType::Inproceedings;
        return;
    }

    if let Some(doi) = entry.field("doi")
        && !is_arxiv_doi(doi)
        && !is_zenodo_doi(doi)
    {
        entry.entry_type = if entry.field("journal").is_some() {
            EntryType::Article
        } else {
            EntryType::Inproceedings
        };
    }
}

/// Normalize whitespace by converting all blocks of consecutive whitespace into a single ASCII SPACE,
/// respecting whitespace which is explicitly escaped by `\`.
///
/// If the input requires normalization, return the new normalized string. Otherwise, the original
/// input is already normalized. Note that the returned string, if any, necessarily has a shorter
/// length than the original string.
pub fn normalize_whitespace(input: &str) -> Option<String> {
    /// Consume from the [`CharIndices`] as long as the input is whitespace. Assumes that we previously
    /// saw a whitespace character.
    ///
    /// The offset is either the index immediately preceding the non-whitespace character, or the end of
    /// the input. The bool indicates if we terminated with a backslash.
    #[inline]
    fn skip_while_ws(chars: &mut CharIndices) -> (usize, bool) {
        for (offset, ch) in chars.by_ref() {
            if !ch.is_whitespace() {
                return (offset, ch == '\\');
            }
        }
        (chars.offset(), false)
    }

    /// Consume from the [`CharIndices`] as long as the input does not require normalization,
    /// assuming that we previously saw a non-whitespace character.
    ///
    /// When `skip_while_ok` terminates, it returns the maximal valid char boundary up to which
    /// point the char iterator does not require modification to normalize whitespace.
    #[inline]
    fn skip_while_ok(chars: &mut CharIndices, mut saw_backslash: bool) -> usize {
        let mut has_trailing_space = false;

        let final_offset = loop {
            if let Some((offset, ch)) = chars.next() {
                if saw_backslash {
                    saw_backslash = false;
                } else {
                    match ch {
                        '\\' => {
                            saw_backslash = true;
                        }
                        ' ' => {
                            if has_trailing_space {
                                break offset;
                            } else {
                                has_trailing_space = true;
                            }
                        }
                        ch if ch.is_whitespace() => {
                            break offset;
                        }
                        _ => has_trailing_space = false,
                    }
                }
            } else {
                break chars.offset();
            }
        };

        if has_trailing_space {
            // SAFETY: `has_trailing_space = true` only when we previously saw a space, which
            // means `final_offset >= 1`.
            unsafe { final_offset.unchecked_sub(1) }
        } else {
            final_offset
        }
    }

    /// Run a single iteration step: first, take whitespace, and then continue as far as possible.
    ///
    /// The returned index pair `(left, right)` is the next contiguous block on which the
    /// characters do not require normalization.
    #[inline]
    fn run_step(chars: &mut CharIndices) -> (usize, usize) {
        let (left, saw_backslash) = skip_while_ws(chars);
        let right = skip_while_ok(chars, saw_backslash);
        (left, right)
    }

    let mut chars = input.char_indices();
    let mut output = String::new();

    loop {
        let (left, right) = run_step(&mut chars);

        // short-circuit termination: no alloc required
        if left == 0 && right == input.len() {
            break None;
        }

        // the `left < right` check is necessary for the edge case of trailing whitespace,
        // which requires an extra iteration step to consume but does not result in a
        // non-trivial block to copy.
        if left < right {
            if !output.is_empty() {
                output.push(' ');
            }
            output.push_str(&input[left..right]);
        }

        if chars.offset() == input.len() {
            break Some(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        // check short circuit
        assert_eq!(normalize_whitespace("a"), None);
        assert_eq!(normalize_whitespace("a b c"), None);
        assert_eq!(normalize_whitespace("a bc def gh"), None);

        // check pruning
        assert_eq!(normalize_whitespace("a b "), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace(" a b"), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace("a  b "), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace("a\tb"), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace("\ta b"), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace("\t a b"), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace(" \n abc b"), Some("abc b".to_owned()));
        assert_eq!(normalize_whitespace(" \n\tad b"), Some("ad b".to_owned()));
        assert_eq!(normalize_whitespace("a\t\n\tba"), Some("a ba".to_owned()));
        assert_eq!(
            normalize_whitespace("aaa\t \n\tb"),
            Some("aaa b".to_owned())
        );
        assert_eq!(normalize_whitespace("a \t \n\tb"), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace("a \t \n\tb\t"), Some("a b".to_owned()));
        assert_eq!(normalize_whitespace(" aaa  b "), Some("aaa b".to_owned()));
        assert_eq!(
            normalize_whitespace("    a    b    "),
            Some("a b".to_owned())
        );
        assert_eq!(
            normalize_whitespace("   a\t   b \n   "),
            Some("a b".to_owned())
        );

        // check escapes
        assert_eq!(normalize_whitespace("a\\  b"), None);
        assert_eq!(normalize_whitespace("a\\b"), None);
        assert_eq!(normalize_whitespace("a\\\\ b"), None);
        assert_eq!(normalize_whitespace("a\\\\\\ b"), None);
        assert_eq!(normalize_whitespace("a\\\\\\\\ b"), None);
        assert_eq!(normalize_whitespace("a\\\\  b"), Some("a\\\\ b".to_owned()));
        assert_eq!(normalize_whitespace("a\\\\\tb"), Some("a\\\\ b".to_owned()));

        // check edge cases
        assert_eq!(normalize_whitespace(""), None);
        assert_eq!(normalize_whitespace(" "), Some("".to_owned()));
        assert_eq!(normalize_whitespace("  "), Some("".to_owned()));
        assert_eq!(normalize_whitespace("\t"), Some("".to_owned()));
        assert_eq!(normalize_whitespace("\n"), Some("".to_owned()));
        assert_eq!(normalize_whitespace(" \t "), Some("".to_owned()));

        // check non-ASCII
        assert_eq!(normalize_whitespace("🍄"), None);
        assert_eq!(normalize_whitespace("\\\u{A0} b"), None);
        assert_eq!(
            normalize_whitespace("\\\u{A0} "),
            Some("\\\u{A0}".to_owned())
        );
        assert_eq!(
            normalize_whitespace("a\u{A0}🍄 c"),
            Some("a 🍄 c".to_owned())
        );
        assert_eq!(
            normalize_whitespace("a \u{A0}🍄 c"),
            Some("a 🍄 c".to_owned())
        );
        assert_eq!(
            normalize_whitespace("🍄 \u{A0} b c"),
            Some("🍄 b c".to_owned())
        );
        assert_eq!(
            normalize_whitespace("🍄\u{A0} b c"),
            Some("🍄 b c".to_owned())
        );
        assert_eq!(
            normalize_whitespace("\u{A0}a b 🍄"),
            Some("a b 🍄".to_owned())
        );
        assert_eq!(
            normalize_whitespace("\u{A0} a b c"),
            Some("a b c".to_owned())
        );
        assert_eq!(
            normalize_whitespace(" \u{A0}a b c"),
            Some("a b c".to_owned())
        );
        assert_eq!(
            normalize_whitespace("a b c\u{A0}"),
            Some("a b c".to_owned())
        );
        assert_eq!(
            normalize_whitespace("a 🍄 c \u{A0}"),
            Some("a 🍄 c".to_owned())
        );
    }

    #[test]
    fn field_aliasing_prefers_existing_target() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("journaltitle", "Journal of Things");
        e.set_field("journal", "Existing Journal");
        normalize(&mut e);
        assert_eq!(e.field("journal"), Some("Existing Journal"));
        assert_eq!(e.field("journaltitle"), None);
    }

    #[test]
    fn date_aliasing_extracts_year() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("date", "2021-05-03");
        normalize(&mut e);
        assert_eq!(e.field("year"), Some("2021"));
    }

    #[test]
    fn doi_lifted_from_url_and_cleaned() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("url", "https://doi.org/10.1234/abc.");
        normalize(&mut e);
        assert_eq!(e.field("doi"), Some("10.1234/abc"));
        assert_eq!(e.field("url"), None);
    }

    #[test]
    fn type_promotion_proceedings() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("title", "Proceedings of Things");
        e.set_field("editor", "Ed Itor");
        normalize(&mut e);
        assert_eq!(e.entry_type, EntryType::Proceedings);
    }

    #[test]
    fn type_promotion_zenodo_stays_misc() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("doi", "10.5281/zenodo.1234");
        normalize(&mut e);
        assert_eq!(e.entry_type, EntryType::Misc);
    }

    #[test]
    fn type_promotion_article_when_journal_present() {
        let mut e = Entry::new(EntryType::Misc, "k");
        e.set_field("doi", "10.1000/xyz");
        e.set_field("journal", "Some Journal");
        normalize(&mut e);
        assert_eq!(e.entry_type, EntryType::Article);
    }
}