//! arXiv adapter: looks up a preprint by arXiv ID from the Atom export API.
//! arXiv enforces the strictest pacing of any source, so calls go through
//! a [`SerializingRateLimiter`] rather than the default fixed-delay gate.
use chrono::{DateTime, Datelike, Local};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ProviderError,
    http::{Fetched, HttpClient},
    logger::warn,
    rate_limit::SerializingRateLimiter,
};

use super::SourceRecord;

#[derive(Deserialize, Debug)]
struct ArxivXML {
    #[serde(default)]
    entry: Vec<ArxivXMLEntry>,
}

#[derive(Deserialize, Debug)]
struct ArxivXMLEntry {
    title: String,
    author: Vec<ArxivXMLAuthor>,
    id: String,
    published: DateTime<Local>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default, rename = "journal_ref")]
    journal_ref: Option<String>,
    #[serde(default, rename = "category")]
    categories: Vec<ArxivXMLCategory>,
}

#[derive(Deserialize, Debug)]
struct ArxivXMLAuthor {
    name: String,
}

#[derive(Deserialize, Debug)]
struct ArxivXMLCategory {
    #[serde(rename = "@term")]
    term: String,
}

fn entry_to_record(entry: ArxivXMLEntry) -> SourceRecord {
    let mut record = SourceRecord::new();

    let arxiv_id = entry
        .id
        .strip_prefix("http://arxiv.org/abs/")
        .or_else(|| entry.id.strip_prefix("https://arxiv.org/abs/"))
        .map(|s| match s.rfind('v') {
            Some(idx) if s[idx + 1..].chars().all(|c| c.is_ascii_digit()) => &s[..idx],
            _ => s,
        })
        .unwrap_or(&entry.id);
    record.insert("arxiv_id".to_owned(), Value::String(arxiv_id.to_owned()));
    record.insert("eprinttype".to_owned(), Value::String("arxiv".to_owned()));

    record.insert("title".to_owned(), Value::String(entry.title.trim().to_owned()));
    record.insert(
        "authors".to_owned(),
        Value::String(entry.author.into_iter().map(|a| a.name).join(" and ")),
    );
    record.insert(
        "published".to_owned(),
        Value::String(entry.published.year().to_string()),
    );
    if let Some(doi) = entry.doi {
        record.insert("doi".to_owned(), Value::String(doi.trim().to_owned()));
    }
    if let Some(journal_ref) = entry.journal_ref {
        record.insert("journal_ref".to_owned(), Value::String(journal_ref));
    }
    if !entry.categories.is_empty() {
        record.insert(
            "categories".to_owned(),
            Value::Array(
                entry
                    .categories
                    .into_iter()
                    .map(|c| Value::String(c.term))
                    .collect(),
            ),
        );
    }
    record
}

/// Fetch `https://export.arxiv.org/api/query?id_list={id}` inside arXiv's
/// serialized critical section.
pub async fn fetch_by_id(
    id: &str,
    client: &HttpClient,
    limiter: &SerializingRateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    let url = format!("https://export.arxiv.org/api/query?max_results=1&id_list={id}");
    let client = client.clone();
    limiter
        .run(move || async move {
            match client.get(&url).await? {
                Fetched::Found(body) => match quick_xml::de::from_str::<ArxivXML>(&body) {
                    Ok(parsed) => Ok(parsed.entry.into_iter().next().map(entry_to_record)),
                    // arXiv's error response format is not stable enough to distinguish
                    // "no result" from "malformed"; either way this is swallowed.
                    Err(_) => Ok(None),
                },
                Fetched::NotFound => Ok(None),
                Fetched::Failed(status) => {
                    warn!("arxiv: unexpected status {status} for id '{id}'");
                    Ok(None)
                }
            }
        })
        .await
}
