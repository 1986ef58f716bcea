//! CLI interface for the DynaRAG client

mod commands;
pub mod ui;


pub use commands::{Command, CommandRunner};

// Re-export core types
pub use dynarag_core::{Error, Result};
