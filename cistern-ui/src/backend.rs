//! Query backends: the HTTP API client and the offline demo source.

use std::time::Duration;

use reqwest::{Client, Url};

use cistern_common::{BackendConfig, Error, QueryResponse, Result};

use crate::container::QueryRequest;
use crate::mock::DemoBackend;

/// Client for `POST /api/collections/{collection}/query`.
#[derive(Debug, Clone)]
pub struct QueryClient {
    http_client: Client,
    base_url: Url,
}

impl QueryClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| Error::url(format!("{}: {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(format!("{} cannot be a base URL", config.url)));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full request URL. The collection is a single, escaped path segment.
    pub fn query_url(&self, request: &QueryRequest) -> Result<Url> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| Error::url(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "collections", request.collection.as_str(), "query"]);

        url.query_pairs_mut()
            .clear()
            .append_pair("start", &request.start.to_string())
            .append_pair("end", &request.end.to_string())
            .append_pair("query", &request.query);

        Ok(url)
    }

    /// Run a query.
    ///
    /// # Errors
    ///
    /// `Error::Http` on transport failure, `Error::Status` on a non-success
    /// status and `Error::Decode` when the body is not a query response.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let url = self.query_url(request)?;
        tracing::debug!(url = %url, generation = request.generation, "Sending query");

        let response = self.http_client.post(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse query response"
            );
            Error::Decode(e)
        })
    }
}

/// Where query results come from.
#[derive(Debug, Clone)]
pub enum Backend {
    Http(QueryClient),
    Demo(DemoBackend),
}

impl Backend {
    /// Run a query against this backend.
    pub async fn query(self, request: QueryRequest) -> Result<QueryResponse> {
        match self {
            Backend::Http(client) => client.query(&request).await,
            Backend::Demo(demo) => Ok(demo.query(&request)),
        }
    }

    /// Short description for the window title and logs.
    pub fn describe(&self) -> String {
        match self {
            Backend::Http(client) => client.base_url().to_string(),
            Backend::Demo(_) => "demo".to_string(),
        }
    }
}
