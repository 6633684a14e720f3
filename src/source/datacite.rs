//! DataCite adapter: looks up a DOI via DataCite's JSON:API.
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ProviderError, http::{Fetched, HttpClient}, logger::warn, rate_limit::RateLimiter};

use super::SourceRecord;

#[derive(Debug, Deserialize)]
struct Envelope {
    data: ResourceData,
}

#[derive(Debug, Deserialize)]
struct ResourceData {
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct Attributes {
    #[serde(default)]
    titles: Vec<Title>,
    #[serde(default)]
    creators: Vec<Creator>,
    #[serde(rename = "publicationYear")]
    publication_year: Option<u32>,
    publisher: Option<String>,
    doi: Option<String>,
    types: Option<Types>,
}

#[derive(Debug, Deserialize)]
struct Title {
    title: String,
}

#[derive(Debug, Deserialize)]
struct Creator {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Types {
    #[serde(rename = "resourceTypeGeneral")]
    resource_type_general: Option<String>,
}

fn attributes_to_record(attributes: Attributes) -> SourceRecord {
    let mut record = SourceRecord::new();
    if let Some(title) = attributes.titles.into_iter().next() {
        record.insert("titles".to_owned(), Value::String(title.title));
    }
    if !attributes.creators.is_empty() {
        let names: Vec<Value> = attributes
            .creators
            .into_iter()
            .filter_map(|c| c.name)
            .map(Value::String)
            .collect();
        record.insert("creators".to_owned(), Value::Array(names));
    }
    if let Some(year) = attributes.publication_year {
        record.insert("publicationYear".to_owned(), Value::Number(year.into()));
    }
    if let Some(publisher) = attributes.publisher {
        record.insert("publisher".to_owned(), Value::String(publisher));
    }
    if let Some(doi) = attributes.doi {
        record.insert("doi".to_owned(), Value::String(doi));
    }
    if let Some(resource_type) = attributes.types.and_then(|t| t.resource_type_general) {
        record.insert(
            "types.resourceTypeGeneral".to_owned(),
            Value::String(resource_type),
        );
    }
    record
}

/// Fetch `https://api.datacite.org/dois/{doi}`.
pub async fn fetch_by_doi(
    doi: &str,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    limiter.acquire().await;
    let url = format!("https://api.datacite.org/dois/{doi}");
    match client.get(&url).await? {
        Fetched::Found(body) => {
            let envelope: Envelope = serde_json::from_str(&body)
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            Ok(Some(attributes_to_record(envelope.data.attributes)))
        }
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("datacite: unexpected status {status} for DOI '{doi}'");
            Ok(None)
        }
    }
}
