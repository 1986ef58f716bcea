//! DynaRAG HTTP client implementation

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use dynarag_core::types::sort_by_relevance;
use dynarag_core::{
    Chunk, DeletionStats, Error, RagService, Result, SimilarChunk, UsageStats,
};

use crate::config::DynaRagConfig;

/// DynaRAG API client
///
/// Each operation is a single HTTP round trip bounded by the configured
/// timeout. Failures are returned as-is; nothing is retried.
pub struct DynaRagClient {
    config: DynaRagConfig,
    base_url: Url,
    client: Client,
}

#[derive(Serialize)]
struct AddChunkRequest<'a> {
    chunk: &'a str,
    filepath: &'a str,
}

#[derive(Serialize)]
struct SimilarRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    k: Option<usize>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    answer: String,
}

impl DynaRagClient {
    /// Create a new client from configuration
    pub fn new(config: DynaRagConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;

        let client = Client::builder()
            .user_agent(concat!("dynarag-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = DynaRagConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &DynaRagConfig {
        &self.config
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Configuration(format!("invalid endpoint path '{}': {}", path, e)))
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, operation: &'static str, request: RequestBuilder) -> Result<String> {
        let request = match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        match timeout(self.config.timeout(), self.round_trip(operation, request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} did not complete within {:?}",
                operation, self.config.timeout()
            ))),
        }
    }

    async fn round_trip(&self, operation: &'static str, request: RequestBuilder) -> Result<String> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "received response");

        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            warn!(operation, status = status.as_u16(), "request rejected by server");
            return Err(Error::from_status(status.as_u16(), body));
        }

        Ok(body)
    }

    async fn similar_with(&self, query: &str, k: Option<usize>) -> Result<Option<Vec<SimilarChunk>>> {
        require_text("query", query)?;

        let url = self.endpoint(&self.config.endpoints.similar)?;
        debug!(operation = "similar", %url, k, "searching similar chunks");

        let request = self.client.post(url).json(&SimilarRequest { text: query, k });
        let body = self.execute("similar", request).await?;

        let mut chunks = match decode_list::<SimilarChunk>("similar", &body)? {
            Some(chunks) => chunks,
            None => return Ok(None),
        };
        sort_by_relevance(&mut chunks);
        Ok(Some(chunks))
    }
}

impl fmt::Debug for DynaRagClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynaRagClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.config.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.config.timeout())
            .finish()
    }
}

#[async_trait]
impl RagService for DynaRagClient {
    async fn add_chunk(&self, text: &str, filepath: &str) -> Result<()> {
        require_text("chunk text", text)?;
        require_text("filepath", filepath)?;

        let url = self.endpoint(&self.config.endpoints.add_chunk)?;
        debug!(operation = "add_chunk", %url, bytes = text.len(), "adding chunk");

        let request = self.client.post(url).json(&AddChunkRequest {
            chunk: text,
            filepath,
        });
        self.execute("add_chunk", request).await?;

        info!(filepath, bytes = text.len(), "chunk added");
        Ok(())
    }

    async fn similar(&self, query: &str) -> Result<Option<Vec<SimilarChunk>>> {
        self.similar_with(query, self.config.top_k).await
    }

    async fn similar_top_k(&self, query: &str, k: usize) -> Result<Option<Vec<SimilarChunk>>> {
        if k == 0 {
            return Err(Error::InvalidInput("k must be greater than zero".to_string()));
        }
        self.similar_with(query, Some(k)).await
    }

    async fn query(&self, question: &str) -> Result<String> {
        require_text("question", question)?;

        let url = self.endpoint(&self.config.endpoints.query)?;
        debug!(operation = "query", %url, "querying");

        let request = self.client.post(url).json(&QueryRequest { text: question });
        let body = self.execute("query", request).await?;

        let response: QueryResponse = decode("query", &body)?;
        let answer = response.answer.trim();
        if answer.is_empty() {
            return Err(Error::Serialization(
                "query returned an empty answer".to_string(),
            ));
        }
        Ok(answer.to_string())
    }

    async fn delete_chunks(&self, dry_run: bool) -> Result<DeletionStats> {
        let url = self.endpoint(&self.config.endpoints.delete_chunks)?;
        debug!(operation = "delete_chunks", %url, dry_run, "deleting chunks");

        let request = self.client.delete(url).query(&[("dry_run", dry_run)]);
        let body = self.execute("delete_chunks", request).await?;

        let stats: DeletionStats = decode("delete_chunks", &body)?;
        info!(
            dry_run,
            embeddings = stats.embedding_count,
            documents = stats.document_count,
            "chunks deleted"
        );
        Ok(stats)
    }

    async fn list_chunks(&self) -> Result<Option<Vec<Chunk>>> {
        let url = self.endpoint(&self.config.endpoints.list_chunks)?;
        debug!(operation = "list_chunks", %url, "listing chunks");

        let body = self.execute("list_chunks", self.client.get(url)).await?;
        decode_list("list_chunks", &body)
    }

    async fn get_stats(&self) -> Result<UsageStats> {
        let url = self.endpoint(&self.config.endpoints.stats)?;
        debug!(operation = "get_stats", %url, "fetching stats");

        let body = self.execute("get_stats", self.client.get(url)).await?;
        decode("get_stats", &body)
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

pub(crate) fn decode<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        Error::Serialization(format!("unexpected {} response: {}", operation, e))
    })
}

/// Decode a list body where `null`, an empty body and `[]` all mean
/// "no chunks stored".
pub(crate) fn decode_list<T: DeserializeOwned>(operation: &str, body: &str) -> Result<Option<Vec<T>>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let items: Option<Vec<T>> = decode(operation, body)?;
    Ok(items.filter(|items| !items.is_empty()))
}
