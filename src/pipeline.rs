//! The outer worker pool: runs the Enrichment Orchestrator over every entry
//! in the Record Store with bounded concurrency, via
//! `stream::iter(...).buffer_unordered(N)`.
use futures::stream::{self, StreamExt};

use crate::entry::Entry;
use crate::identifiers;
use crate::merge::ValidationResult;
use crate::normalize;
use crate::orchestrator::{self, Limiters};

/// Normalize, lint, and enrich every entry, running up to `parallelism`
/// entries concurrently. Workers may finish in any order; the results are resorted back
/// to `entries`' input order by citation-key before returning.
pub async fn run(entries: &[Entry], limiters: &Limiters, parallelism: usize) -> Vec<ValidationResult> {
    let parallelism = parallelism.max(1);

    let mut results: Vec<ValidationResult> = stream::iter(entries.iter().cloned())
        .map(|mut entry| async move {
            normalize::normalize(&mut entry);
            let ids = identifiers::extract(&entry);
            let mut result = ValidationResult::new(entry.clone());
            orchestrator::enrich(&mut result, &entry, &ids, limiters).await;
            result
        })
        .buffer_unordered(parallelism)
        .collect()
        .await;

    let input_order: std::collections::HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.citekey.as_str(), i))
        .collect();
    results.sort_by_key(|r| input_order.get(r.entry_key.as_str()).copied().unwrap_or(usize::MAX));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;
    use crate::http::HttpClient;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_with_no_identifiers_and_no_title_without_panicking() {
        let entry = Entry::new(EntryType::Misc, "k");
        let client = HttpClient::new("test@example.com", Duration::from_secs(1)).unwrap();
        let limiters = Limiters::new(client, Duration::from_millis(1), Duration::from_millis(1));
        let results = run(&[entry], &limiters, 4).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry_key, "k");
    }
}
