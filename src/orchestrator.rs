//! The Enrichment Orchestrator: for one entry, dispatches every applicable
//! source adapter concurrently, folds the results into a `ValidationResult`,
//! and narrates progress under the shared print lock.
use std::future::Future;
use std::pin::Pin;

use futures::future::join_all;

use crate::entry::Entry;
use crate::http::HttpClient;
use crate::identifiers::{self, Identifiers};
use crate::logger::info;
use crate::merge::ValidationResult;
use crate::normalize;
use crate::rate_limit::{RateLimiter, SerializingRateLimiter};
use crate::source::{self, SourceName, SourceRecord};

/// Shared, per-process limiters and client for one orchestration run,
/// handed to every entry's enrichment task.
pub struct Limiters {
    pub client: HttpClient,
    pub crossref: RateLimiter,
    pub arxiv: SerializingRateLimiter,
    pub zenodo: RateLimiter,
    pub dblp: RateLimiter,
    pub datacite: RateLimiter,
    pub pubmed: RateLimiter,
    pub semantic_scholar: RateLimiter,
    pub openalex: RateLimiter,
}

impl Limiters {
    pub fn new(client: HttpClient, source_delay: std::time::Duration, arxiv_delay: std::time::Duration) -> Self {
        Self {
            client,
            crossref: RateLimiter::new(source_delay),
            arxiv: SerializingRateLimiter::new(arxiv_delay),
            zenodo: RateLimiter::new(source_delay),
            dblp: RateLimiter::new(source_delay),
            datacite: RateLimiter::new(source_delay),
            pubmed: RateLimiter::new(source_delay),
            semantic_scholar: RateLimiter::new(source_delay),
            openalex: RateLimiter::new(source_delay),
        }
    }
}

type Fetch<'a> = Pin<Box<dyn Future<Output = (SourceName, Result<Option<SourceRecord>, crate::error::ProviderError>)> + Send + 'a>>;

fn wrap<'a>(
    name: SourceName,
    fut: impl Future<Output = Result<Option<SourceRecord>, crate::error::ProviderError>> + Send + 'a,
) -> Fetch<'a> {
    Box::pin(async move { (name, fut.await) })
}

/// Dispatch every adapter implied by `ids`/the entry's title+author, collect
/// results, fold them into `result`, and run the one-shot recursive
/// discovery round.
pub async fn enrich(result: &mut ValidationResult, entry: &Entry, ids: &Identifiers, limiters: &Limiters) {
    let mut tasks: Vec<Fetch<'_>> = Vec::new();

    // This whole family is gated on a *non-arXiv* DOI; an arXiv-minted DOI
    // is routed to the arXiv adapter below instead.
    if let Some(doi) = ids.doi.as_deref().filter(|doi| !normalize::is_arxiv_doi(doi)) {
        info!("Fetching Crossref for {}…", result.entry_key);
        tasks.push(wrap(
            SourceName::Crossref,
            source::crossref::fetch_by_doi(doi, &limiters.client, &limiters.crossref),
        ));
        info!("Fetching DataCite for {}…", result.entry_key);
        tasks.push(wrap(
            SourceName::Datacite,
            source::datacite::fetch_by_doi(doi, &limiters.client, &limiters.datacite),
        ));
        if doi.starts_with("10.5281/zenodo.") {
            info!("Fetching Zenodo for {}…", result.entry_key);
            tasks.push(wrap(
                SourceName::Zenodo,
                source::zenodo::fetch_by_doi(doi, &limiters.client, &limiters.zenodo),
            ));
        }
        // Always scheduled regardless of Crossref's outcome.
        info!("Fetching OpenAlex for {}…", result.entry_key);
        tasks.push(wrap(
            SourceName::Openalex,
            source::openalex::fetch_by_doi(doi, &limiters.client, &limiters.openalex),
        ));
    }

    if let Some(arxiv_id) = ids.arxiv_id.as_deref() {
        info!("Fetching arXiv for {}…", result.entry_key);
        tasks.push(wrap(
            SourceName::Arxiv,
            source::arxiv::fetch_by_id(arxiv_id, &limiters.client, &limiters.arxiv),
        ));
    }

    if let Some(pmid) = ids.pmid.as_deref() {
        info!("Fetching PubMed for {}…", result.entry_key);
        tasks.push(wrap(
            SourceName::Pubmed,
            source::pubmed::fetch_by_pmid(pmid, &limiters.client, &limiters.pubmed),
        ));
    }

    if let Some(title) = entry.field("title").filter(|t| t.len() > 10) {
        let author = entry.field("author");
        info!("Fetching DBLP for {}…", result.entry_key);
        tasks.push(wrap(
            SourceName::Dblp,
            source::dblp::fetch(title, author, &limiters.client, &limiters.dblp),
        ));
        info!("Fetching Semantic Scholar for {}…", result.entry_key);
        tasks.push(wrap(
            SourceName::SemanticScholar,
            source::semantic_scholar::fetch(title, ids.doi.as_deref(), &limiters.client, &limiters.semantic_scholar),
        ));
        // OpenAlex-by-title is only scheduled when no DOI was provided at
        // all; OpenAlex-by-DOI already covers the DOI case above.
        if ids.doi.is_none() {
            info!("Fetching OpenAlex for {}…", result.entry_key);
            tasks.push(wrap(
                SourceName::Openalex,
                source::openalex::fetch_by_title(title, &limiters.client, &limiters.openalex),
            ));
        }
    }

    run_fetches(result, tasks).await;

    // One-shot recursive discovery: if the entry itself lacked a DOI/arXiv
    // ID, look for one in whatever sources already answered, and schedule
    // the newly implied adapters exactly once.
    let mut followup: Vec<Fetch<'_>> = Vec::new();

    if ids.doi.is_none() {
        // "first non-empty wins, in that order".
        let discovered_doi = [
            SourceName::Dblp,
            SourceName::SemanticScholar,
            SourceName::Openalex,
            SourceName::Pubmed,
        ]
        .into_iter()
        .find_map(|source| {
            result
                .all_sources_data
                .get(&source)
                .and_then(|record| source::str_field(record, "doi"))
        });

        if let Some(doi) = discovered_doi {
            if !result.all_sources_data.contains_key(&SourceName::Crossref) {
                info!("Fetching Crossref for {} (discovered DOI)…", result.entry_key);
                followup.push(wrap(
                    SourceName::Crossref,
                    source::crossref::fetch_by_doi(&doi, &limiters.client, &limiters.crossref),
                ));
            }
            if doi.starts_with("10.5281/zenodo.")
                && !result.all_sources_data.contains_key(&SourceName::Zenodo)
            {
                info!("Fetching Zenodo for {} (discovered DOI)…", result.entry_key);
                followup.push(wrap(
                    SourceName::Zenodo,
                    source::zenodo::fetch_by_doi(&doi, &limiters.client, &limiters.zenodo),
                ));
            }
            if !result.all_sources_data.contains_key(&SourceName::Datacite) {
                info!("Fetching DataCite for {} (discovered DOI)…", result.entry_key);
                followup.push(wrap(
                    SourceName::Datacite,
                    source::datacite::fetch_by_doi(&doi, &limiters.client, &limiters.datacite),
                ));
            }
            if !result.all_sources_data.contains_key(&SourceName::Openalex) {
                info!("Fetching OpenAlex for {} (discovered DOI)…", result.entry_key);
                followup.push(wrap(
                    SourceName::Openalex,
                    source::openalex::fetch_by_doi(&doi, &limiters.client, &limiters.openalex),
                ));
            }
        }
    }

    if ids.arxiv_id.is_none() && !result.all_sources_data.contains_key(&SourceName::Arxiv) {
        let discovered_arxiv = [
            SourceName::Dblp,
            SourceName::SemanticScholar,
            SourceName::Openalex,
            SourceName::Crossref,
        ]
        .into_iter()
        .find_map(|source| {
            let record = result.all_sources_data.get(&source)?;
            ["arxiv_id", "eprint", "doi", "url"]
                .into_iter()
                .find_map(|key| source::str_field(record, key))
                .and_then(|value| identifiers::arxiv_id_from_text(&value))
        });

        if let Some(arxiv_id) = discovered_arxiv {
            info!("Fetching arXiv for {} (discovered arXiv ID)…", result.entry_key);
            followup.push(wrap(
                SourceName::Arxiv,
                source::arxiv::fetch_by_id(&arxiv_id, &limiters.client, &limiters.arxiv),
            ));
        }
    }

    run_fetches(result, followup).await;

    result.remerge();
    result.has_doi = ids.doi.is_some();
    result.has_arxiv = ids.arxiv_id.is_some();

    // doi_valid is true when Crossref, DataCite, or OpenAlex (by DOI)
    // returned data, or when the DOI was itself an arXiv-DOI and arXiv
    // returned a record for it.
    let is_arxiv_doi = ids
        .doi
        .as_deref()
        .is_some_and(|doi| identifiers::arxiv_id_from_doi(doi).is_some());
    result.doi_valid = result.has_doi
        && (result.all_sources_data.contains_key(&SourceName::Crossref)
            || result.all_sources_data.contains_key(&SourceName::Datacite)
            || result.all_sources_data.contains_key(&SourceName::Openalex)
            || (is_arxiv_doi && result.all_sources_data.contains_key(&SourceName::Arxiv)));
    result.arxiv_valid = result.all_sources_data.contains_key(&SourceName::Arxiv);

    if result.has_doi && !result.doi_valid {
        result.lint_messages.push(crate::lint::LintMessage {
            level: crate::lint::Level::Warning,
            code: "doi_not_found",
            field: Some("doi".to_owned()),
            message: format!("DOI present but not found in any source for '{}'", result.entry_key),
        });
    }
    if result.has_arxiv && !result.arxiv_valid {
        result.lint_messages.push(crate::lint::LintMessage {
            level: crate::lint::Level::Warning,
            code: "arxiv_not_found",
            field: Some("eprint".to_owned()),
            message: format!("arXiv ID present but not found on arXiv for '{}'", result.entry_key),
        });
    }
}

async fn run_fetches(result: &mut ValidationResult, tasks: Vec<Fetch<'_>>) {
    if tasks.is_empty() {
        return;
    }
    for (source, outcome) in join_all(tasks).await {
        match outcome {
            Ok(Some(record)) => {
                info!("✓ Found data from {source} for {}", result.entry_key);
                result.add_source(source, record);
            }
            Ok(None) => {
                info!("✗ {source} has no record for {}", result.entry_key);
            }
            Err(err) => {
                info!("✗ {source} failed for {}: {err}", result.entry_key);
            }
        }
    }
}
