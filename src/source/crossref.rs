//! Crossref adapter: looks up a work by DOI.
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ProviderError,
    http::{Fetched, HttpClient},
    logger::warn,
    rate_limit::RateLimiter,
};

use super::SourceRecord;

#[derive(Debug, Deserialize)]
struct Envelope {
    message: Work,
}

#[derive(Debug, Deserialize)]
struct Work {
    title: Option<Vec<String>>,
    author: Option<Vec<Contributor>>,
    #[serde(rename = "container-title")]
    container_title: Option<Vec<String>>,
    #[serde(rename = "published-print")]
    published_print: Option<DateParts>,
    volume: Option<String>,
    page: Option<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "ISSN")]
    issn: Option<Vec<String>>,
    #[serde(rename = "type")]
    type_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Contributor {
    family: String,
    given: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateParts {
    #[serde(rename = "date-parts")]
    date_parts: Vec<Vec<u32>>,
}

fn work_to_record(work: Work) -> SourceRecord {
    let mut record = SourceRecord::new();
    if let Some(titles) = work.title
        && let Some(title) = titles.into_iter().next()
    {
        record.insert("title".to_owned(), Value::String(title));
    }
    if let Some(authors) = work.author {
        let names: Vec<Value> = authors
            .into_iter()
            .map(|c| {
                Value::String(match c.given {
                    Some(given) => format!("{given} {}", c.family),
                    None => c.family,
                })
            })
            .collect();
        record.insert("author".to_owned(), Value::Array(names));
    }
    if let Some(containers) = work.container_title
        && let Some(container) = containers.into_iter().next()
    {
        record.insert("container-title".to_owned(), Value::String(container));
    }
    if let Some(DateParts { date_parts }) = work.published_print
        && let Some(first) = date_parts.first()
        && let Some(&year) = first.first()
    {
        record.insert("year".to_owned(), Value::Number(year.into()));
    }
    if let Some(volume) = work.volume {
        record.insert("volume".to_owned(), Value::String(volume));
    }
    if let Some(page) = work.page {
        record.insert("page".to_owned(), Value::String(page));
    }
    if let Some(doi) = work.doi {
        record.insert("DOI".to_owned(), Value::String(doi));
    }
    if let Some(issn) = work.issn.and_then(|v| v.into_iter().next()) {
        record.insert("ISSN".to_owned(), Value::String(issn));
    }
    if let Some(type_) = work.type_ {
        record.insert("type".to_owned(), Value::String(type_));
    }
    record
}

/// Fetch `https://api.crossref.org/works/{doi}`.
pub async fn fetch_by_doi(
    doi: &str,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    limiter.acquire().await;

    let url = format!("https://api.crossref.org/works/{doi}");
    match client.get(&url).await? {
        Fetched::Found(body) => {
            let envelope: Envelope = serde_json::from_str(&body)
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            Ok(Some(work_to_record(envelope.message)))
        }
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("crossref: unexpected status {status} for DOI '{doi}'");
            Ok(None)
        }
    }
}
