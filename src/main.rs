use anyhow::Result;
use clap::Parser;
use colored::*;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

use dynarag_cli::{Command, CommandRunner};
use dynarag_client::{DynaRagClient, DynaRagConfig};

#[derive(Parser)]
#[command(name = "dynarag")]
#[command(about = "Command-line client for the DynaRAG API", long_about = None)]
struct Cli {
    /// Server address (overrides DYNARAG_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// API token (overrides DYNARAG_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Per-request timeout in seconds (overrides DYNARAG_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = cli.overrides();
    let config = DynaRagConfig::from_env_with(|key| overrides.get(key).cloned())?;

    let runner = CommandRunner::new(DynaRagClient::new(config)?);

    match runner.run(&cli.command).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}

impl Cli {
    /// Global flags keyed by the environment variable each one replaces.
    fn overrides(&self) -> HashMap<&'static str, String> {
        let mut overrides = HashMap::new();
        if let Some(base_url) = &self.base_url {
            overrides.insert("DYNARAG_BASE_URL", base_url.clone());
        }
        if let Some(token) = &self.token {
            overrides.insert("DYNARAG_API_TOKEN", token.clone());
        }
        if let Some(secs) = self.timeout {
            overrides.insert("DYNARAG_TIMEOUT_SECS", secs.to_string());
        }
        overrides
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
