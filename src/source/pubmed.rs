//! PubMed adapter: fetches a citation by PMID from the E-utilities
//! `efetch` endpoint, which returns PubMed XML.
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ProviderError, http::{Fetched, HttpClient}, logger::warn, rate_limit::RateLimiter};

use super::SourceRecord;

#[derive(Debug, Deserialize)]
struct PubmedArticleSet {
    #[serde(rename = "PubmedArticle", default)]
    articles: Vec<PubmedArticle>,
}

#[derive(Debug, Deserialize)]
struct PubmedArticle {
    #[serde(rename = "MedlineCitation")]
    medline_citation: MedlineCitation,
}

#[derive(Debug, Deserialize)]
struct MedlineCitation {
    #[serde(rename = "Article")]
    article: Article,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(rename = "ArticleTitle")]
    article_title: Option<String>,
    #[serde(rename = "AuthorList", default)]
    author_list: Option<AuthorList>,
    #[serde(rename = "Journal")]
    journal: Option<Journal>,
}

#[derive(Debug, Deserialize)]
struct AuthorList {
    #[serde(rename = "Author", default)]
    author: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(rename = "LastName")]
    last_name: Option<String>,
    #[serde(rename = "ForeName")]
    fore_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Journal {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "JournalIssue")]
    journal_issue: Option<JournalIssue>,
}

#[derive(Debug, Deserialize)]
struct JournalIssue {
    #[serde(rename = "PubDate")]
    pub_date: Option<PubDate>,
}

#[derive(Debug, Deserialize)]
struct PubDate {
    #[serde(rename = "Year")]
    year: Option<String>,
}

fn article_to_record(article: Article) -> SourceRecord {
    let mut record = SourceRecord::new();
    if let Some(title) = article.article_title {
        record.insert("ArticleTitle".to_owned(), Value::String(title));
    }
    if let Some(authors) = article.author_list {
        let names: Vec<Value> = authors
            .author
            .into_iter()
            .map(|a| {
                Value::String(
                    [a.fore_name, a.last_name]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            })
            .collect();
        record.insert("Author".to_owned(), Value::Array(names));
    }
    if let Some(journal) = article.journal {
        if let Some(title) = journal.title {
            record.insert("Journal.Title".to_owned(), Value::String(title));
        }
        if let Some(year) = journal
            .journal_issue
            .and_then(|i| i.pub_date)
            .and_then(|d| d.year)
        {
            record.insert("PubDate.Year".to_owned(), Value::String(year));
        }
    }
    record
}

/// Fetch `https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi?db=pubmed&id={pmid}&retmode=xml`.
pub async fn fetch_by_pmid(
    pmid: &str,
    client: &HttpClient,
    limiter: &RateLimiter,
) -> Result<Option<SourceRecord>, ProviderError> {
    limiter.acquire().await;
    let url = format!(
        "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi?db=pubmed&id={pmid}&retmode=xml"
    );
    match client.get(&url).await? {
        Fetched::Found(body) => match quick_xml::de::from_str::<PubmedArticleSet>(&body) {
            Ok(parsed) => Ok(parsed
                .articles
                .into_iter()
                .next()
                .map(|a| article_to_record(a.medline_citation.article))),
            Err(err) => {
                warn!("pubmed: unexpected response format for pmid '{pmid}': {err}");
                Ok(None)
            }
        },
        Fetched::NotFound => Ok(None),
        Fetched::Failed(status) => {
            warn!("pubmed: unexpected status {status} for pmid '{pmid}'");
            Ok(None)
        }
    }
}
