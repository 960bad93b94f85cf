//! Jira MCP agent: serves the Jira tools over stdio.
//!
//! stdout carries the protocol stream, so all logging goes to stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

use jira_mcp_agent::config;
use jira_mcp_agent::context::AppContext;
use jira_mcp_agent::tools::JiraTools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = config::load_config()?;
    if config.is_configured() {
        tracing::info!(
            base_url = %config.base_url,
            project = %config.project_key,
            "configuration loaded",
        );
    } else {
        tracing::warn!("JIRA_BASE_URL, JIRA_EMAIL or JIRA_API_TOKEN missing; Jira tools will report NotConfigured");
    }

    let ctx = Arc::new(AppContext::new(config));
    let service = JiraTools::new(ctx)
        .serve(stdio())
        .await
        .context("failed to start MCP server on stdio")?;

    tracing::info!("jira-mcp-agent ready");
    service.waiting().await.context("MCP server error")?;
    tracing::info!("jira-mcp-agent shut down");
    Ok(())
}
