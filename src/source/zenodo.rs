//! Zenodo adapter: looks up a DOI with the `10.5281/zenodo.` prefix via
//! Zenodo's REST API.
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ProviderError, http::{Fetched, HttpClient}, logger::warn, rate_limit::RateLimiter};

use super::SourceRecord;

pub const DOI_PREFIX: &str = "10.5281/zenodo.";

#[derive(Debug, Deserialize)]
struct Record {
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    title: Option<String>,
    #[serde(default)]
    creators: Vec<Creator>,
    publication_date: Option<String>,
    #[serde(default)]
    related_identifiers: Vec<RelatedIdentifier>,
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Creator {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelatedIdentifier {
    identifier: String,
    relation: String,
}

fn metadata_to_record(metadata: Metadata) -> SourceRecord {
    let mut record = SourceRecord::new();
    if let Some(title) = metadata.title {
        record.insert("title".to_owned(), Value::String(title));
    }
    if !metadata.creators.is_empty() {
        let names: Vec<Value> = metadata
            .creators
            .into_iter()
            .filter_map(|c| c.name)
            .map(Value::String)
            .collect();
        record.insert("creators".to_owned(), Value::Array(names));
    }
    if let Some(date) = metadata.publication_date {
        record.insert("publication_date".to_owned(), Value::String(date));
    }
    record.insert(
        "publisher".to_owned(),
        Value::String("Zenodo".to_owned()),
    );
    if let Some(doi) = metadata.doi {
        record.insert("doi".to_owned(), Value::String(doi));
    }
    if !metadata.related_identifiers.is_empty() {
        let related: Vec<Value> = metadata
            .related_identifiers
            .into_iter()
            .map(|r| Value::String(format!("{}:{}", r.relation, r.identifier)))
            .collect();
        record.insert("related_identifiers".to_owned(), Value::Array(related));
    }
    record
}

/// Extract the numeric Zenodo record id from a `10.5281/zenodo.NNNN` DOI.
fn record_id(doi: &str) -> Option<&str> {
    doi.strip_prefix(DOI_PREFIX)
}

/// Fetch `https://zenodo.org/api/records/{id}` for a Zenodo-prefixed DOI.
pub async fn fetch_by_doi(
    doi: &str,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    let Some(id) = record_id(doi) else {
        return Ok(None);
    };
    limiter.acquire().await;
    let url = format!("https://zenodo.org/api/records/{id}");
    match client.get(&url).await? {
        Fetched::Found(body) => {
            let record: Record = serde_json::from_str(&body)
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            Ok(Some(metadata_to_record(record.metadata)))
        }
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("zenodo: unexpected status {status} for DOI '{doi}'");
            Ok(None)
        }
    }
}
