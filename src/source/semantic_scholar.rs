//! Semantic Scholar adapter: looks up a paper by title, using a DOI as a
//! disambiguation hint.
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ProviderError, http::{Fetched, HttpClient}, logger::warn, rate_limit::RateLimiter};

use super::SourceRecord;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
struct Paper {
    title: Option<String>,
    authors: Option<Vec<Author>>,
    year: Option<u32>,
    venue: Option<String>,
    #[serde(rename = "externalIds")]
    external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

fn paper_to_record(paper: Paper) -> SourceRecord {
    let mut record = SourceRecord::new();
    if let Some(title) = paper.title {
        record.insert("title".to_owned(), Value::String(title));
    }
    if let Some(authors) = paper.authors {
        let names: Vec<Value> = authors
            .into_iter()
            .filter_map(|a| a.name)
            .map(Value::String)
            .collect();
        record.insert("authors".to_owned(), Value::Array(names));
    }
    if let Some(year) = paper.year {
        record.insert("year".to_owned(), Value::Number(year.into()));
    }
    if let Some(venue) = paper.venue {
        record.insert("venue".to_owned(), Value::String(venue));
    }
    if let Some(doi) = paper.external_ids.and_then(|e| e.doi) {
        record.insert("doi".to_owned(), Value::String(doi));
    }
    record
}

/// Fetch `https://api.semanticscholar.org/graph/v1/paper/search?query={title}`,
/// preferring a hit whose `externalIds.DOI` matches `doi_hint` when given.
pub async fn fetch(
    title: &str,
    doi_hint: Option<&str>,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    limiter.acquire().await;
    let mut url = reqwest::Url::parse("https://api.semanticscholar.org/graph/v1/paper/search")
        .expect("static URL is valid");
    url.query_pairs_mut()
        .append_pair("query", title)
        .append_pair("fields", "title,authors,year,venue,externalIds")
        .append_pair("limit", "5");
    match client.get(url.as_str()).await? {
        Fetched::Found(body) => {
            let mut parsed: SearchResponse = serde_json::from_str(&body)
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            let matched_index = doi_hint.and_then(|doi| {
                parsed.data.iter().position(|p| {
                    p.external_ids
                        .as_ref()
                        .and_then(|e| e.doi.as_deref())
                        .is_some_and(|d| d.eq_ignore_ascii_case(doi))
                })
            });
            let chosen = match matched_index {
                Some(i) if i < parsed.data.len() => Some(parsed.data.swap_remove(i)),
                _ => {
                    if parsed.data.is_empty() {
                        None
                    } else {
                        Some(parsed.data.swap_remove(0))
                    }
                }
            };
            Ok(chosen.map(paper_to_record))
        }
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("semantic_scholar: unexpected status {status} for title search");
            Ok(None)
        }
    }
}
