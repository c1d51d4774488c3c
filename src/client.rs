//! HTTP transport for the SECOP II open-data API.
//!
//! The retriever only talks to [`RecordsApi`]; [`SocrataClient`] is the
//! production implementation over `reqwest`.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::query::PageRequest;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

/// Body of one page response, classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    /// A JSON array of record objects
    Records(Vec<Value>),
    /// Any other JSON value; carries the JSON type name
    Malformed(&'static str),
}

impl PageBody {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(records) => PageBody::Records(records),
            other => PageBody::Malformed(json_kind(&other)),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Source of paginated records
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// Fetch a single page. A non-success response is an error.
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageBody>;
}

/// Client for a Socrata `query.json` endpoint
pub struct SocrataClient {
    client: Client,
    endpoint: String,
    app_token: Option<String>,
}

impl SocrataClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            app_token: config.app_token.clone(),
        })
    }

    /// Full URL for a page, with the query expression URL-encoded
    pub fn page_url(&self, request: &PageRequest) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("pageSize", request.page_size.to_string()),
                ("pageNumber", request.page_number.to_string()),
                ("query", request.query.clone()),
            ],
        )
        .map_err(|e| Error::Config(format!("Invalid endpoint {}: {}", self.endpoint, e)))
    }
}

#[async_trait]
impl RecordsApi for SocrataClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageBody> {
        let url = self.page_url(request)?;
        debug!(page = request.page_number, %url, "requesting page");

        let response = self
            .client
            .get(url)
            .header("X-App-Token", self.app_token.as_deref().unwrap_or(""))
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "Network response was not ok: {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        Ok(PageBody::from_value(body))
    }
}
