//! Records exchanged with a DynaRAG server

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// A stored unit of source text, as returned by the chunk listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "DocumentID")]
    pub document_id: i64,
    #[serde(rename = "ChunkText")]
    pub chunk_text: String,
    #[serde(rename = "ChunkSize")]
    pub chunk_size: i64,
    #[serde(rename = "FilePath")]
    pub file_path: String,
    #[serde(rename = "ModelName")]
    pub model_name: String,
    #[serde(rename = "CreatedAt")]
    pub created_at: String,
}

impl Chunk {
    /// Creation time, if the server's timestamp is RFC 3339 or a plain
    /// `YYYY-MM-DD HH:MM:SS` UTC timestamp.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// A chunk matched by a similarity search, with its scores.
///
/// Lower `distance` means closer; `similarity` is the server's normalized
/// inverse of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarChunk {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "DocumentID")]
    pub document_id: i64,
    #[serde(rename = "ChunkText")]
    pub chunk_text: String,
    #[serde(rename = "ChunkSize")]
    pub chunk_size: i64,
    #[serde(rename = "FilePath")]
    pub file_path: String,
    #[serde(rename = "Distance")]
    pub distance: f64,
    #[serde(rename = "Similarity")]
    pub similarity: f64,
    #[serde(rename = "ModelName", default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(rename = "CreatedAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl SimilarChunk {
    /// Total order used to rank search results: closest first, then highest
    /// similarity, then lowest id.
    pub fn relevance_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| other.similarity.total_cmp(&self.similarity))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort search results into a deterministic relevance order.
pub fn sort_by_relevance(chunks: &mut [SimilarChunk]) {
    chunks.sort_by(SimilarChunk::relevance_cmp);
}

/// What a deletion removed, or would remove on a dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionStats {
    #[serde(rename = "EmbeddingCount")]
    pub embedding_count: u64,
    #[serde(rename = "DocumentCount")]
    pub document_count: u64,
    #[serde(rename = "FilePaths", default, deserialize_with = "null_as_empty")]
    pub file_paths: Vec<String>,
}

impl DeletionStats {
    pub fn is_empty(&self) -> bool {
        self.embedding_count == 0 && self.document_count == 0 && self.file_paths.is_empty()
    }
}

/// Aggregate usage counters for the account behind the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_bytes: u64,
    pub api_requests: u64,
    pub document_count: u64,
    pub chunk_count: u64,
}

impl UsageStats {
    /// True when no documents or chunks are stored. `api_requests` and
    /// `total_bytes` are metering counters and are not considered.
    pub fn is_store_empty(&self) -> bool {
        self.document_count == 0 && self.chunk_count == 0
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
