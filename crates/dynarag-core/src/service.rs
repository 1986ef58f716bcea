//! The DynaRAG service trait

use async_trait::async_trait;

use crate::{Chunk, DeletionStats, Result, SimilarChunk, UsageStats};

/// Operations offered by a DynaRAG server.
///
/// List-returning operations use `None` for "no chunks stored" so an empty
/// store and an empty page can never be confused. Implementations are
/// stateless between calls and do not retry.
#[async_trait]
pub trait RagService: Send + Sync {
    /// Submit text and its source path for embedding and storage.
    async fn add_chunk(&self, text: &str, filepath: &str) -> Result<()>;

    /// Chunks closest to `query`, most relevant first.
    async fn similar(&self, query: &str) -> Result<Option<Vec<SimilarChunk>>>;

    /// Like [`RagService::similar`], with an explicit limit on the number of results.
    async fn similar_top_k(&self, query: &str, k: usize) -> Result<Option<Vec<SimilarChunk>>>;

    /// Ask a question answered from the stored chunks.
    async fn query(&self, question: &str) -> Result<String>;

    /// Delete every stored chunk. With `dry_run` nothing is removed and the
    /// returned stats describe what would have been.
    async fn delete_chunks(&self, dry_run: bool) -> Result<DeletionStats>;

    /// Every stored chunk with its metadata.
    async fn list_chunks(&self) -> Result<Option<Vec<Chunk>>>;

    async fn get_stats(&self) -> Result<UsageStats>;
}
