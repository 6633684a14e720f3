//! DBLP adapter: looks up a publication by title (+ author hint) via DBLP's
//! JSON search API.
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ProviderError, http::{Fetched, HttpClient}, logger::warn, rate_limit::RateLimiter};

use super::SourceRecord;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: ResultWrapper,
}

#[derive(Debug, Deserialize)]
struct ResultWrapper {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hit: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    info: Info,
}

#[derive(Debug, Deserialize)]
struct Info {
    title: Option<String>,
    authors: Option<Authors>,
    year: Option<String>,
    venue: Option<String>,
    #[serde(rename = "type")]
    type_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Authors {
    author: AuthorList,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
enum AuthorList {
    One(AuthorEntry),
    Many(Vec<AuthorEntry>),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
enum AuthorEntry {
    Named { text: String },
    Plain(String),
}

impl AuthorEntry {
    fn name(&self) -> &str {
        match self {
            Self::Named { text } => text,
            Self::Plain(s) => s,
        }
    }
}

fn hit_to_record(hit: Hit) -> SourceRecord {
    let mut record = SourceRecord::new();
    let info = hit.info;
    if let Some(title) = info.title {
        record.insert("title".to_owned(), Value::String(title));
    }
    if let Some(authors) = info.authors {
        let names: Vec<Value> = match authors.author {
            AuthorList::One(a) => vec![Value::String(a.name().to_owned())],
            AuthorList::Many(v) => v.into_iter().map(|a| Value::String(a.name().to_owned())).collect(),
        };
        record.insert("authors".to_owned(), Value::Array(names));
    }
    if let Some(year) = info.year {
        record.insert("year".to_owned(), Value::String(year));
    }
    if let Some(venue) = info.venue {
        record.insert("venue".to_owned(), Value::String(venue));
    }
    if let Some(type_) = info.type_ {
        record.insert("type".to_owned(), Value::String(type_));
    }
    record
}

/// Fetch `https://dblp.org/search/publ/api?q={title} {author}&format=json`,
/// taking the top hit.
pub async fn fetch(
    title: &str,
    author: Option<&str>,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    limiter.acquire().await;
    let query = match author {
        Some(author) => format!("{title} {author}"),
        None => title.to_owned(),
    };
    let mut url =
        reqwest::Url::parse("https://dblp.org/search/publ/api").expect("static URL is valid");
    url.query_pairs_mut()
        .append_pair("q", &query)
        .append_pair("format", "json")
        .append_pair("h", "1");
    match client.get(url.as_str()).await? {
        Fetched::Found(body) => {
            let parsed: SearchResponse = serde_json::from_str(&body)
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            Ok(parsed.result.hits.hit.into_iter().next().map(hit_to_record))
        }
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("dblp: unexpected status {status} for title search");
            Ok(None)
        }
    }
}
