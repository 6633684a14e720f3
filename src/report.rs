//! A minimal plain-text validation report. Anything richer than per-entry
//! counts and a grand total is left to a real front-end.
use std::fmt::Write as _;

use crate::merge::ValidationResult;

/// Render a summary of every entry's outcome: counts of missing/updated/
/// conflicting/identical fields, plus a grand total across all entries.
pub fn render(results: &[ValidationResult]) -> String {
    let mut out = String::new();
    let mut total_missing = 0;
    let mut total_updated = 0;
    let mut total_conflict = 0;
    let mut total_identical = 0;

    for result in results {
        total_missing += result.fields_missing.len();
        total_updated += result.fields_updated.len();
        total_conflict += result.fields_conflict.len();
        total_identical += result.fields_identical.len();

        let _ = writeln!(out, "{}", result.entry_key);
        let _ = writeln!(
            out,
            "  missing={} updated={} conflict={} identical={} different={}",
            result.fields_missing.len(),
            result.fields_updated.len(),
            result.fields_conflict.len(),
            result.fields_identical.len(),
            result.fields_different.len(),
        );
        if result.has_doi && !result.doi_valid {
            let _ = writeln!(out, "  warning: DOI not confirmed by any source");
        }
        if result.has_arxiv && !result.arxiv_valid {
            let _ = writeln!(out, "  warning: arXiv ID not confirmed on arXiv");
        }
        for message in &result.lint_messages {
            let _ = writeln!(out, "  [{:?}] {}", message.level, message.message);
        }
    }

    let _ = writeln!(
        out,
        "\n{} entries: {total_missing} missing, {total_updated} updated, {total_conflict} conflicts, {total_identical} identical",
        results.len(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Entry, EntryType};

    #[test]
    fn renders_a_grand_total_line() {
        let entry = Entry::new(EntryType::Misc, "k");
        let result = ValidationResult::new(entry);
        let text = render(&[result]);
        assert!(text.contains("1 entries:"));
        assert!(text.contains("k"));
    }
}
