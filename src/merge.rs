//! The Priority Merger: folds per-source comparisons into one
//! `ValidationResult` per entry.
use std::collections::BTreeMap;

use crate::compare::{self, Comparison, FieldClassification};
use crate::entry::{Entry, EntryType};
use crate::lint::{self, LintMessage};
use crate::source::{PRIORITY_ORDER, SourceName, SourceRecord};

/// The full per-entry validation/enrichment outcome.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub entry_key: String,
    pub entry_type: EntryType,
    pub normalized_entry: Entry,

    pub lint_messages: Vec<LintMessage>,
    pub fields_missing: Vec<String>,

    pub fields_updated: BTreeMap<String, String>,
    pub fields_conflict: BTreeMap<String, (String, String)>,
    pub fields_identical: BTreeMap<String, String>,
    pub fields_different: BTreeMap<String, (String, String)>,

    pub field_sources: BTreeMap<String, SourceName>,
    pub field_source_options: BTreeMap<String, Vec<SourceName>>,
    pub all_sources_data: BTreeMap<SourceName, SourceRecord>,
    pub original_values: BTreeMap<String, String>,

    pub has_doi: bool,
    pub doi_valid: bool,
    pub has_arxiv: bool,
    pub arxiv_valid: bool,
}

impl ValidationResult {
    /// Start a result from a normalized-but-not-yet-enriched entry. Captures
    /// `original_values` and runs the Schema Linter.
    pub fn new(normalized_entry: Entry) -> Self {
        let original_values = normalized_entry.fields.clone();
        let lint_messages = lint::lint(&normalized_entry);
        let fields_missing = lint_messages
            .iter()
            .filter(|m| m.code == "missing_required")
            .filter_map(|m| m.field.clone())
            .collect();

        Self {
            entry_key: normalized_entry.citekey.clone(),
            entry_type: normalized_entry.entry_type,
            normalized_entry,
            lint_messages,
            fields_missing,
            fields_updated: BTreeMap::new(),
            fields_conflict: BTreeMap::new(),
            fields_identical: BTreeMap::new(),
            fields_different: BTreeMap::new(),
            field_sources: BTreeMap::new(),
            field_source_options: BTreeMap::new(),
            all_sources_data: BTreeMap::new(),
            original_values,
            has_doi: false,
            doi_valid: false,
            has_arxiv: false,
            arxiv_valid: false,
        }
    }

    /// Fold in one source's raw record, re-running the merge of all
    /// classification maps. Call once per source that
    /// returned data; call `finish` once all sources have been folded in.
    pub fn add_source(&mut self, source: SourceName, record: SourceRecord) {
        self.all_sources_data.insert(source, record);
    }

    /// Re-run the Priority Merger over every field of every recorded
    /// source's comparison. This is idempotent and is also what `restore`
    /// uses to recompute a result without re-fetching.
    pub fn remerge(&mut self) {
        self.fields_updated.clear();
        self.fields_conflict.clear();
        self.fields_identical.clear();
        self.fields_different.clear();
        self.field_sources.clear();
        self.field_source_options.clear();

        let mut seen_normalized: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for &source in PRIORITY_ORDER {
            let Some(record) = self.all_sources_data.get(&source) else {
                continue;
            };
            let comparison = compare::compare(&self.normalized_entry, source, record);

            for field in comparison.fields().map(str::to_owned).collect::<Vec<_>>() {
                let Some(classification) = comparison.classification_of(&field) else {
                    continue;
                };
                let api_value = match &classification {
                    FieldClassification::Missing(api) => api.clone(),
                    FieldClassification::NearDifference(_, api) => api.clone(),
                    FieldClassification::Conflict(_, api) => api.clone(),
                    FieldClassification::Identical(value) => value.clone(),
                };
                let normalized = compare::normalize_string(&api_value, &field);

                let seen = seen_normalized.entry(field.clone()).or_default();
                if !seen.contains(&normalized) {
                    seen.push(normalized);
                    self.field_source_options
                        .entry(field.clone())
                        .or_default()
                        .push(source);
                }

                if self.field_sources.contains_key(&field) {
                    continue;
                }

                self.field_sources.insert(field.clone(), source);
                match classification {
                    FieldClassification::Missing(api) => {
                        self.fields_updated.insert(field, api);
                    }
                    FieldClassification::Identical(value) => {
                        self.fields_identical.insert(field, value);
                    }
                    FieldClassification::NearDifference(local, api) => {
                        self.fields_different.insert(field, (local, api));
                    }
                    FieldClassification::Conflict(local, api) => {
                        self.fields_conflict.insert(field, (local, api));
                    }
                }
            }
        }
    }

    /// Apply the priority-merger's proposed value for every field in
    /// updated/conflict/different.
    pub fn apply_all_proposed(&mut self) {
        for (field, value) in std::mem::take(&mut self.fields_updated) {
            self.normalized_entry.set_field(field, value);
        }
        for (field, (_, api)) in std::mem::take(&mut self.fields_conflict) {
            self.normalized_entry.set_field(field, api);
        }
        for (field, (_, api)) in std::mem::take(&mut self.fields_different) {
            self.normalized_entry.set_field(field, api);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;
    use serde_json::json;

    fn record(pairs: &[(&str, &str)]) -> SourceRecord {
        let mut record = SourceRecord::new();
        for (k, v) in pairs {
            record.insert((*k).to_owned(), json!(v));
        }
        record
    }

    #[test]
    fn higher_priority_source_wins() {
        let entry = Entry::new(EntryType::Article, "k");
        let mut result = ValidationResult::new(entry);
        result.add_source(SourceName::Openalex, record(&[("title", "OpenAlex Title")]));
        result.add_source(SourceName::Crossref, record(&[("title", "Crossref Title")]));
        result.remerge();
        assert_eq!(
            result.fields_updated.get("title"),
            Some(&"Crossref Title".to_owned())
        );
        assert_eq!(result.field_sources.get("title"), Some(&SourceName::Crossref));
    }

    #[test]
    fn field_source_options_dedup_by_normalized_value() {
        let entry = Entry::new(EntryType::Article, "k");
        let mut result = ValidationResult::new(entry);
        result.add_source(SourceName::Crossref, record(&[("title", "Same Title")]));
        result.add_source(SourceName::Arxiv, record(&[("title", "same title")]));
        result.remerge();
        assert_eq!(result.field_source_options.get("title").unwrap().len(), 1);
    }

    #[test]
    fn apply_all_proposed_writes_updated_fields() {
        let entry = Entry::new(EntryType::Article, "k");
        let mut result = ValidationResult::new(entry);
        result.add_source(SourceName::Crossref, record(&[("title", "New Title")]));
        result.remerge();
        result.apply_all_proposed();
        assert_eq!(result.normalized_entry.field("title"), Some("New Title"));
    }

    #[test]
    fn fields_missing_excludes_recommended_gaps() {
        let mut entry = Entry::new(EntryType::Article, "k");
        entry.set_field("author", "A. Author");
        entry.set_field("title", "A Title");
        entry.set_field("journal", "A Journal");
        entry.set_field("year", "2020");
        // volume/pages are recommended, not required, for `article`.
        let result = ValidationResult::new(entry);
        assert!(result.fields_missing.is_empty());
    }

    #[test]
    fn fields_missing_includes_required_gaps() {
        let entry = Entry::new(EntryType::Article, "k");
        let result = ValidationResult::new(entry);
        assert!(result.fields_missing.contains(&"author".to_owned()));
        assert!(result.fields_missing.contains(&"title".to_owned()));
    }
}
