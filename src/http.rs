//! A thin async HTTP client shared by every source adapter.
use std::time::Duration;

use reqwest::{Client as ReqwestClient, StatusCode};

use crate::error::ProviderError;

fn user_agent(contact_email: &str) -> String {
    format!(
        "{}/{} (mailto:{contact_email})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    )
}

/// The outcome of a single outbound GET request: 200 parses, 404 is a
/// clean no-result, and any other status is a no-result plus a warning.
#[derive(Debug)]
pub enum Fetched {
    Found(String),
    NotFound,
    Failed(StatusCode),
}

#[derive(Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
}

impl HttpClient {
    pub fn new(contact_email: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let inner = ReqwestClient::builder()
            .user_agent(user_agent(contact_email))
            .timeout(timeout)
            .build()
            .map_err(ProviderError::NetworkFailure)?;
        Ok(Self { inner })
    }

    pub async fn get(&self, url: &str) -> Result<Fetched, ProviderError> {
        let response = match self.inner.get(url).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return Err(ProviderError::Timeout),
            Err(err) => return Err(ProviderError::NetworkFailure(err)),
        };

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(ProviderError::NetworkFailure)?;
                Ok(Fetched::Found(body))
            }
            StatusCode::NOT_FOUND => Ok(Fetched::NotFound),
            other => Ok(Fetched::Failed(other)),
        }
    }
}
