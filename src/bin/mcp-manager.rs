use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jira_mcp_agent::manager::cli::{self, Cli};
use jira_mcp_agent::manager::ManagerPaths;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    cli::run(cli, &ManagerPaths::from_env()).await
}
