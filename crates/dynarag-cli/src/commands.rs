//! Subcommands and their execution against a DynaRAG service

use clap::Subcommand;
use dynarag_core::{Error, RagService, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::ui;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Add a file (or literal text) as a chunk
    Add {
        /// Source path recorded with the chunk; read unless --text is given
        filepath: PathBuf,
        /// Use this text instead of the file's contents
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Show the chunks most similar to a query
    Similar {
        query: String,
        /// Maximum number of results
        #[arg(short)]
        k: Option<usize>,
    },
    /// Ask a question answered from the stored chunks
    Query { question: String },
    /// List every stored chunk
    List,
    /// Delete every stored chunk
    Delete {
        /// Report what would be deleted without deleting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show usage statistics
    Stats,
}

/// Runs commands against a service and renders their results
pub struct CommandRunner<S: RagService> {
    service: S,
}

impl<S: RagService> CommandRunner<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Execute a command and return its rendered output
    pub async fn run(&self, command: &Command) -> Result<String> {
        debug!(?command, "running command");

        match command {
            Command::Add { filepath, text } => {
                let text = match text {
                    Some(text) => text.clone(),
                    None => tokio::fs::read_to_string(filepath).await?,
                };
                let path = filepath.to_string_lossy();
                if text.trim().is_empty() {
                    return Err(Error::InvalidInput(format!("{} has no text to add", path)));
                }
                self.service.add_chunk(&text, &path).await?;
                Ok(ui::render_added(&path, text.len()))
            }
            Command::Similar { query, k } => {
                let results = match k {
                    Some(k) => self.service.similar_top_k(query, *k).await?,
                    None => self.service.similar(query).await?,
                };
                Ok(ui::render_similar(results.as_deref()))
            }
            Command::Query { question } => {
                let answer = self.service.query(question).await?;
                Ok(ui::render_answer(&answer))
            }
            Command::List => {
                let chunks = self.service.list_chunks().await?;
                Ok(ui::render_chunks(chunks.as_deref()))
            }
            Command::Delete { dry_run } => {
                let stats = self.service.delete_chunks(*dry_run).await?;
                Ok(ui::render_deletion(&stats, *dry_run))
            }
            Command::Stats => {
                let stats = self.service.get_stats().await?;
                Ok(ui::render_stats(&stats))
            }
        }
    }
}
