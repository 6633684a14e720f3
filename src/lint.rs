//! The Schema Linter: checks a canonical entry against its entry type's
//! required/recommended field schema.
use crate::entry::{Entry, EntryType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LintMessage {
    pub level: Level,
    pub code: &'static str,
    pub message: String,
    pub field: Option<String>,
}

impl LintMessage {
    fn error(code: &'static str, message: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            level: Level::Error,
            code,
            message: message.into(),
            field: field.map(str::to_owned),
        }
    }

    fn warning(code: &'static str, message: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            level: Level::Warning,
            code,
            message: message.into(),
            field: field.map(str::to_owned),
        }
    }
}

/// The static required/recommended schema for one entry type.
pub struct Schema {
    pub required: &'static [&'static str],
    pub required_any: &'static [&'static [&'static str]],
    pub recommended: &'static [&'static str],
}

pub const fn schema_for(entry_type: EntryType) -> Schema {
    use EntryType::*;
    match entry_type {
        Article => Schema {
            required: &["author", "title", "journal", "year"],
            required_any: &[],
            recommended: &["volume", "pages"],
        },
        Inproceedings => Schema {
            required: &["author", "title", "booktitle", "year"],
            required_any: &[],
            recommended: &["pages"],
        },
        Book => Schema {
            required: &["title", "publisher", "year"],
            required_any: &[&["author", "editor"]],
            recommended: &[],
        },
        Inbook => Schema {
            required: &["title", "publisher", "year"],
            required_any: &[&["author", "editor"], &["chapter", "pages"]],
            recommended: &[],
        },
        Incollection => Schema {
            required: &["author", "title", "booktitle", "publisher", "year"],
            required_any: &[],
            recommended: &["pages", "chapter"],
        },
        Proceedings => Schema {
            required: &["title", "year"],
            required_any: &[],
            recommended: &[],
        },
        Mastersthesis | Phdthesis => Schema {
            required: &["author", "title", "school", "year"],
            required_any: &[],
            recommended: &[],
        },
        Techreport => Schema {
            required: &["author", "title", "institution", "year"],
            required_any: &[],
            recommended: &["number"],
        },
        Manual | Booklet => Schema {
            required: &["title"],
            required_any: &[],
            recommended: &[],
        },
        Unpublished => Schema {
            required: &["author", "title", "note"],
            required_any: &[],
            recommended: &[],
        },
        Misc => Schema {
            required: &[],
            required_any: &[],
            recommended: &[],
        },
    }
}

const UNSTRUCTURED_VENUE_MARKERS: &[&str] = &[
    "submitted to",
    "presented at",
    "conference",
    "workshop",
    "symposium",
    "proceedings",
];

fn is_present(entry: &Entry, field: &str) -> bool {
    entry.field(field).is_some_and(|v| !v.trim().is_empty())
}

/// Lint a canonical entry, returning an ordered list of messages.
pub fn lint(entry: &Entry) -> Vec<LintMessage> {
    let mut messages = Vec::new();
    let schema = schema_for(entry.entry_type);

    for &field in schema.required {
        if !is_present(entry, field) {
            messages.push(LintMessage::error(
                "missing_required",
                format!("required field '{field}' is missing"),
                Some(field),
            ));
        }
    }

    for group in schema.required_any {
        if !group.iter().any(|&f| is_present(entry, f)) {
            messages.push(LintMessage::error(
                "missing_required_any",
                format!("at least one of {group:?} is required"),
                None,
            ));
        }
    }

    for &field in schema.recommended {
        if !is_present(entry, field) {
            messages.push(LintMessage::warning(
                "missing_recommended",
                format!("recommended field '{field}' is missing"),
                Some(field),
            ));
        }
    }

    match entry.entry_type {
        EntryType::Inbook | EntryType::Incollection => {
            if !is_present(entry, "pages") && !is_present(entry, "chapter") {
                messages.push(LintMessage::warning(
                    "missing_context",
                    "neither 'pages' nor 'chapter' is present",
                    None,
                ));
            }
        }
        EntryType::Article => {
            let has_volume = is_present(entry, "volume");
            let has_pages = is_present(entry, "pages");
            if !has_volume && !has_pages {
                messages.push(LintMessage::warning(
                    "missing_vol_pages_strong",
                    "neither 'volume' nor 'pages' is present",
                    None,
                ));
            } else if !has_volume || !has_pages {
                messages.push(LintMessage::warning(
                    "missing_vol_pages_weak",
                    "exactly one of 'volume'/'pages' is present",
                    None,
                ));
            }
        }
        EntryType::Inproceedings | EntryType::Proceedings => {
            if !is_present(entry, "booktitle") {
                let text = [entry.field("note"), entry.field("howpublished")]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_ascii_lowercase();
                if UNSTRUCTURED_VENUE_MARKERS
                    .iter()
                    .any(|marker| text.contains(marker))
                {
                    messages.push(LintMessage::warning(
                        "venue_unstructured",
                        "venue appears only as unstructured text in 'note'/'howpublished'",
                        None,
                    ));
                }
            }
        }
        _ => {}
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_of(entry_type: EntryType) -> Entry {
        Entry::new(entry_type, "k")
    }

    #[test]
    fn article_missing_required_fields() {
        let messages = lint(&entry_of(EntryType::Article));
        let codes: Vec<_> = messages.iter().map(|m| m.code).collect();
        assert!(codes.contains(&"missing_required"));
    }

    #[test]
    fn article_missing_vol_pages_weak() {
        let mut e = entry_of(EntryType::Article);
        e.set_field("author", "A");
        e.set_field("title", "T");
        e.set_field("journal", "J");
        e.set_field("year", "2020");
        e.set_field("volume", "3");
        let messages = lint(&e);
        assert!(messages.iter().any(|m| m.code == "missing_vol_pages_weak"));
    }

    #[test]
    fn book_required_any_author_editor() {
        let mut e = entry_of(EntryType::Book);
        e.set_field("title", "T");
        e.set_field("publisher", "P");
        e.set_field("year", "2020");
        let messages = lint(&e);
        assert!(messages.iter().any(|m| m.code == "missing_required_any"));
    }

    #[test]
    fn inproceedings_venue_unstructured() {
        let mut e = entry_of(EntryType::Inproceedings);
        e.set_field("author", "A");
        e.set_field("title", "T");
        e.set_field("year", "2020");
        e.set_field("note", "Presented at a workshop");
        let messages = lint(&e);
        assert!(messages.iter().any(|m| m.code == "venue_unstructured"));
    }
}
