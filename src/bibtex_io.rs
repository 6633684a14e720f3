//! A narrow wrapper around the textual BibTeX parser/serializer, backed by
//! `serde_bibtex`.
use crate::entry::{entries_from_bibtex, Entry};
use crate::error::BibtexDataError;

/// Parse every entry in a textual bibliography, in file order.
pub fn parse_all(bibtex: &str) -> impl Iterator<Item = Result<Entry, BibtexDataError>> + '_ {
    entries_from_bibtex(bibtex.as_bytes())
}

/// Serialize entries back to their textual form, one per blank-line-separated
/// block, in the canonical field order.
pub fn serialize_all<'a>(entries: impl Iterator<Item = &'a Entry>) -> String {
    let mut out = String::new();
    for entry in entries {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&entry.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    #[test]
    fn round_trips_a_single_entry() {
        let src = "@article{k, title = {T}, author = {A}}";
        let entries: Vec<_> = parse_all(src).collect::<Result<_, _>>().unwrap();
        assert_eq!(entries.len(), 1);
        let serialized = serialize_all(entries.iter());
        let reparsed: Vec<_> = parse_all(&serialized).collect::<Result<_, _>>().unwrap();
        assert_eq!(entries, reparsed);
    }

    #[test]
    fn serializes_multiple_entries_separated_by_blank_line() {
        let a = Entry::new(EntryType::Misc, "a");
        let b = Entry::new(EntryType::Misc, "b");
        let text = serialize_all([&a, &b].into_iter());
        assert_eq!(text.matches("@misc").count(), 2);
        assert!(text.contains("\n\n@misc{b"));
    }
}
