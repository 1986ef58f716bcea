//! HTTP client for the DynaRAG API
//!
//! This crate provides the reqwest implementation of the [`RagService`] trait.

mod client;
mod config;


pub use client::DynaRagClient;
pub use config::{DynaRagConfig, Endpoints};

// Re-export core types for convenience
pub use dynarag_core::{
    Chunk, DeletionStats, Error, RagService, Result, SimilarChunk, UsageStats,
};
