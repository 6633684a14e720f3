//! OpenAlex adapter: looks up a work by DOI or by title.
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ProviderError, http::{Fetched, HttpClient}, logger::warn, rate_limit::RateLimiter};

use super::SourceRecord;

#[derive(Debug, Deserialize)]
struct Work {
    title: Option<String>,
    authorships: Option<Vec<Authorship>>,
    publication_year: Option<u32>,
    primary_location: Option<PrimaryLocation>,
    doi: Option<String>,
    biblio: Option<Biblio>,
    #[serde(rename = "type")]
    type_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    author: AuthorRef,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrimaryLocation {
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Biblio {
    volume: Option<String>,
    issue: Option<String>,
    first_page: Option<String>,
    last_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    results: Vec<Work>,
}

fn work_to_record(work: Work) -> SourceRecord {
    let mut record = SourceRecord::new();
    if let Some(title) = work.title {
        record.insert("title".to_owned(), Value::String(title));
    }
    if let Some(authorships) = work.authorships {
        let names: Vec<Value> = authorships
            .into_iter()
            .filter_map(|a| a.author.display_name)
            .map(Value::String)
            .collect();
        record.insert("authorships".to_owned(), Value::Array(names));
    }
    if let Some(year) = work.publication_year {
        record.insert("publication_year".to_owned(), Value::Number(year.into()));
    }
    if let Some(name) = work
        .primary_location
        .and_then(|l| l.source)
        .and_then(|s| s.display_name)
    {
        record.insert(
            "primary_location.source.display_name".to_owned(),
            Value::String(name),
        );
    }
    if let Some(doi) = work.doi {
        let bare = doi
            .strip_prefix("https://doi.org/")
            .unwrap_or(&doi)
            .to_owned();
        record.insert("doi".to_owned(), Value::String(bare));
    }
    if let Some(biblio) = work.biblio {
        if let Some(volume) = biblio.volume {
            record.insert("biblio.volume".to_owned(), Value::String(volume));
        }
        if let Some(issue) = biblio.issue {
            record.insert("biblio.issue".to_owned(), Value::String(issue));
        }
        if let (Some(first), Some(last)) = (biblio.first_page, biblio.last_page) {
            record.insert(
                "biblio.pages".to_owned(),
                Value::String(format!("{first}--{last}")),
            );
        }
    }
    if let Some(type_) = work.type_ {
        record.insert("type".to_owned(), Value::String(type_));
    }
    record
}

/// Fetch `https://api.openalex.org/works/https://doi.org/{doi}`.
pub async fn fetch_by_doi(
    doi: &str,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    limiter.acquire().await;
    let url = format!("https://api.openalex.org/works/https://doi.org/{doi}");
    match client.get(&url).await? {
        Fetched::Found(body) => {
            let work: Work = serde_json::from_str(&body)
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            Ok(Some(work_to_record(work)))
        }
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("openalex: unexpected status {status} for DOI '{doi}'");
            Ok(None)
        }
    }
}

/// Fetch `https://api.openalex.org/works?search={title}` and take the top hit.
pub async fn fetch_by_title(
    title: &str,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    limiter.acquire().await;
    let mut url = reqwest::Url::parse("https://api.openalex.org/works")
        .expect("static URL is valid");
    url.query_pairs_mut()
        .append_pair("search", title)
        .append_pair("per-page", "1");
    match client.get(url.as_str()).await? {
        Fetched::Found(body) => {
            let results: SearchResults = serde_json::from_str(&body)
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            Ok(results.results.into_iter().next().map(work_to_record))
        }
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("openalex: unexpected status {status} for title search");
            Ok(None)
        }
    }
}
