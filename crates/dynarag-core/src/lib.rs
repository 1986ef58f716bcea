//! Core traits and types for the DynaRAG client
//!
//! This crate defines the records exchanged with a DynaRAG server, the error
//! taxonomy shared by every crate in the workspace, and the [`RagService`]
//! trait that the HTTP client implements and the CLI consumes.

pub mod error;
pub mod service;
pub mod types;


pub use error::{Error, Result};
pub use service::RagService;
pub use types::{Chunk, DeletionStats, SimilarChunk, UsageStats};
