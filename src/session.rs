//! Session State: holds one pending `ValidationResult` per entry awaiting
//! review, and applies accept/reject/restore/accept_all_global decisions by
//! committing into the Record Store. The accept/reject/restore commands
//! read a record, apply a change, and write it back, one field at a time.
use std::collections::HashMap;

use crate::error::SessionError;
use crate::merge::ValidationResult;
use crate::protocol::Decision;
use crate::store::Store;

/// Holds every entry's pending validation outcome until it is committed or
/// discarded.
#[derive(Default)]
pub struct Session {
    pending: HashMap<String, ValidationResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: ValidationResult) {
        self.pending.insert(result.entry_key.clone(), result);
    }

    pub fn get(&self, entry_key: &str) -> Option<&ValidationResult> {
        self.pending.get(entry_key)
    }

    pub fn results(&self) -> impl Iterator<Item = &ValidationResult> {
        self.pending.values()
    }

    fn result_mut(&mut self, entry_key: &str) -> Result<&mut ValidationResult, SessionError> {
        self.pending
            .get_mut(entry_key)
            .ok_or_else(|| SessionError::UnknownEntry(entry_key.to_owned()))
    }

    /// Revert `field` to its pre-session value, deleting it if it was absent
    /// originally.
    fn revert_field(result: &mut ValidationResult, field: &str) {
        match result.original_values.get(field) {
            Some(value) => {
                result.normalized_entry.set_field(field, value.clone());
            }
            None => {
                result.normalized_entry.fields.remove(field);
            }
        }
    }

    /// Apply a single field-level decision:
    /// - `accept` writes the proposed value (priority-merged, or the single
    ///   source's recomputed value when one is selected) into the normalized
    ///   entry, then removes `field` from every pending map so it is not
    ///   re-offered.
    /// - `reject` restores `field` to `original_values[field]` (deleting it
    ///   if it was absent before the session) and likewise stops offering it.
    /// - `restore` unconditionally reverts `field` to `original_values[field]`
    ///   and re-runs the Priority Merger, without re-fetching from sources.
    ///
    /// Every branch commits the resulting entry into the Record Store.
    pub fn decide(&mut self, store: &mut Store, entry_key: &str, field: &str, decision: Decision) -> Result<(), SessionError> {
        self.decide_from_source(store, entry_key, field, decision, None)
    }

    /// As `decide`, but when `source` names a source present in
    /// `all_sources_data`, `Decision::Accept` recomputes the Field
    /// Comparator for that single source and applies its value instead of
    /// the priority-merged proposal.
    pub fn decide_from_source(
        &mut self,
        store: &mut Store,
        entry_key: &str,
        field: &str,
        decision: Decision,
        source: Option<crate::source::SourceName>,
    ) -> Result<(), SessionError> {
        let result = self.result_mut(entry_key)?;

        match decision {
            Decision::Accept => {
                let selected = source.and_then(|source| {
                    let record = result.all_sources_data.get(&source)?;
                    let comparison = crate::compare::compare(&result.normalized_entry, source, record);
                    match comparison.classification_of(field)? {
                        crate::compare::FieldClassification::Missing(api)
                        | crate::compare::FieldClassification::NearDifference(_, api)
                        | crate::compare::FieldClassification::Conflict(_, api) => Some(api),
                        crate::compare::FieldClassification::Identical(value) => Some(value),
                    }
                });

                let proposed = selected.or_else(|| {
                    result
                        .fields_updated
                        .get(field)
                        .cloned()
                        .or_else(|| result.fields_conflict.get(field).map(|(_, api)| api.clone()))
                        .or_else(|| result.fields_different.get(field).map(|(_, api)| api.clone()))
                });

                if let Some(value) = proposed {
                    result.normalized_entry.set_field(field, value);
                    result.fields_updated.remove(field);
                    result.fields_conflict.remove(field);
                    result.fields_different.remove(field);
                    store.replace(entry_key, result.normalized_entry.clone())?;
                }
            }
            Decision::Reject => {
                Self::revert_field(result, field);
                result.fields_updated.remove(field);
                result.fields_conflict.remove(field);
                result.fields_different.remove(field);
                store.replace(entry_key, result.normalized_entry.clone())?;
            }
            Decision::Restore => {
                Self::revert_field(result, field);
                result.remerge();
                store.replace(entry_key, result.normalized_entry.clone())?;
            }
        }
        Ok(())
    }

    /// For every pending entry, apply the priority-merger's proposed value
    /// for every field in updated/conflict/different and commit it to the
    /// store — unlike `decide`, this operates on the whole session at once,
    /// not a single entry.
    ///
    /// A commit failure for one entry (e.g. its citekey is no longer in the
    /// store) is logged by the caller via the returned list rather than
    /// aborting the remaining entries.
    pub fn accept_all_global(&mut self, store: &mut Store) -> Vec<(String, SessionError)> {
        let mut errors = Vec::new();
        for (entry_key, result) in self.pending.iter_mut() {
            result.apply_all_proposed();
            if let Err(err) = store.replace(entry_key, result.normalized_entry.clone()) {
                errors.push((entry_key.clone(), err.into()));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceName;
    use serde_json::json;

    fn store_with_one_entry(key: &str) -> Store {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("refval-session-test-{key}-{}.bib", std::process::id()));
        std::fs::write(&path, format!("@article{{{key}, title = {{Old Title Text}}, author = {{Some Author}}, journal = {{J}}, year = {{2020}}}}")).unwrap();
        Store::load(&path).unwrap()
    }

    #[test]
    fn accept_writes_proposed_value_into_store() {
        let mut store = store_with_one_entry("k");
        let entry = store.get("k").unwrap().clone();
        let mut result = ValidationResult::new(entry);
        let mut record = crate::source::SourceRecord::new();
        record.insert("title".to_owned(), json!("New Title"));
        result.add_source(SourceName::Crossref, record);
        result.remerge();

        let mut session = Session::new();
        session.insert(result);
        session.decide(&mut store, "k", "title", Decision::Accept).unwrap();

        assert_eq!(store.get("k").unwrap().field("title"), Some("New Title"));
    }

    #[test]
    fn unknown_entry_is_rejected() {
        let mut store = store_with_one_entry("k");
        let mut session = Session::new();
        assert!(matches!(
            session.decide(&mut store, "missing", "title", Decision::Accept),
            Err(SessionError::UnknownEntry(_))
        ));
    }

    #[test]
    fn accept_all_global_applies_every_proposed_field() {
        let mut store = store_with_one_entry("k");
        let entry = store.get("k").unwrap().clone();
        let mut result = ValidationResult::new(entry);
        let mut record = crate::source::SourceRecord::new();
        record.insert("title".to_owned(), json!("New Title"));
        result.add_source(SourceName::Crossref, record);
        result.remerge();

        let mut session = Session::new();
        session.insert(result);
        assert!(session.accept_all_global(&mut store).is_empty());

        assert_eq!(store.get("k").unwrap().field("title"), Some("New Title"));
    }

    #[test]
    fn reject_restores_original_value_and_stops_offering_the_field() {
        let mut store = store_with_one_entry("k");
        let entry = store.get("k").unwrap().clone();
        let mut result = ValidationResult::new(entry);
        let mut record = crate::source::SourceRecord::new();
        record.insert("title".to_owned(), json!("New Title"));
        result.add_source(SourceName::Crossref, record);
        result.remerge();

        let mut session = Session::new();
        session.insert(result);
        session.decide(&mut store, "k", "title", Decision::Reject).unwrap();

        assert_eq!(store.get("k").unwrap().field("title"), Some("Old Title Text"));
        assert!(!session.get("k").unwrap().fields_updated.contains_key("title"));
    }

    #[test]
    fn reject_deletes_a_field_that_was_absent_before_the_session() {
        let mut store = store_with_one_entry("k");
        let entry = store.get("k").unwrap().clone();
        let mut result = ValidationResult::new(entry);
        let mut record = crate::source::SourceRecord::new();
        record.insert("volume".to_owned(), json!("42"));
        result.add_source(SourceName::Crossref, record);
        result.remerge();

        let mut session = Session::new();
        session.insert(result);
        session.decide(&mut store, "k", "volume", Decision::Accept).unwrap();
        assert_eq!(store.get("k").unwrap().field("volume"), Some("42"));

        session.decide(&mut store, "k", "volume", Decision::Reject).unwrap();
        assert_eq!(store.get("k").unwrap().field("volume"), None);
    }

    #[test]
    fn restore_reverts_an_accepted_field_and_re_offers_it() {
        let mut store = store_with_one_entry("k");
        let entry = store.get("k").unwrap().clone();
        let mut result = ValidationResult::new(entry);
        let mut record = crate::source::SourceRecord::new();
        record.insert("title".to_owned(), json!("New Title"));
        result.add_source(SourceName::Crossref, record);
        result.remerge();

        let mut session = Session::new();
        session.insert(result);
        session.decide(&mut store, "k", "title", Decision::Accept).unwrap();
        assert_eq!(store.get("k").unwrap().field("title"), Some("New Title"));

        session.decide(&mut store, "k", "title", Decision::Restore).unwrap();
        assert_eq!(store.get("k").unwrap().field("title"), Some("Old Title Text"));
        assert_eq!(
            session.get("k").unwrap().fields_updated.get("title"),
            Some(&"New Title".to_owned())
        );
    }
}
