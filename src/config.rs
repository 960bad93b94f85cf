//! Environment-driven configuration.
//!
//! The server reads `JIRA_*` variables:
//!   - `JIRA_BASE_URL` (or `JIRA_URL`)   site root, e.g. `https://acme.atlassian.net`
//!   - `JIRA_EMAIL` (or `JIRA_USER`)     account email used for basic auth
//!   - `JIRA_API_TOKEN`                  API token
//!   - `JIRA_PROJECT_KEY`                default project (default `CRM`)
//!   - `JIRA_DEFAULT_BOARD_ID`           board for `list_my_tasks` (default 67)
//!   - `JIRA_USER_CACHE_TTL_SECS`        colleague lookup cache (default 600)
//!   - `JIRA_DIGEST_CACHE_TTL_SECS`      issue digest cache (default 60)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "JIRA_";

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    #[serde(default, alias = "url")]
    pub base_url: String,
    #[serde(default, alias = "user")]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_project_key")]
    pub project_key: String,
    #[serde(default = "default_board_id")]
    pub default_board_id: u64,
    #[serde(default = "default_user_cache_ttl")]
    pub user_cache_ttl_secs: u64,
    #[serde(default = "default_digest_cache_ttl")]
    pub digest_cache_ttl_secs: u64,
}

fn default_project_key() -> String {
    "CRM".to_string()
}

fn default_board_id() -> u64 {
    67
}

fn default_user_cache_ttl() -> u64 {
    600
}

fn default_digest_cache_ttl() -> u64 {
    60
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            email: String::new(),
            api_token: String::new(),
            project_key: default_project_key(),
            default_board_id: default_board_id(),
            user_cache_ttl_secs: default_user_cache_ttl(),
            digest_cache_ttl_secs: default_digest_cache_ttl(),
        }
    }
}

impl JiraConfig {
    /// Trim every string field and drop trailing slashes from the base URL.
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.email = self.email.trim().to_string();
        self.api_token = self.api_token.trim().to_string();
        self.project_key = self.project_key.trim().to_string();
        if self.project_key.is_empty() {
            self.project_key = default_project_key();
        }
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.email.is_empty() && !self.api_token.is_empty()
    }

    pub fn auth(&self) -> (&str, &str) {
        (&self.email, &self.api_token)
    }

    pub fn api_base(&self) -> String {
        format!("{}/rest/api/3", self.base_url)
    }

    pub fn agile_api_base(&self) -> String {
        format!("{}/rest/agile/1.0", self.base_url)
    }

    pub fn user_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.user_cache_ttl_secs)
    }

    pub fn digest_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.digest_cache_ttl_secs)
    }
}

pub fn load_config() -> Result<JiraConfig> {
    let config: JiraConfig = envy::prefixed(ENV_PREFIX)
        .from_env()
        .context("Failed to read JIRA_* environment variables")?;
    Ok(config.normalized())
}

/// Build a config from explicit key/value pairs, as `load_config` would from
/// the environment.
pub fn config_from_pairs<I>(pairs: I) -> Result<JiraConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let config: JiraConfig = envy::prefixed(ENV_PREFIX)
        .from_iter(pairs)
        .context("Failed to parse JIRA_* variables")?;
    Ok(config.normalized())
}

/// Root directory of the manager's registry and server checkouts.
pub fn manager_home() -> PathBuf {
    if let Some(dir) = std::env::var_os("MCP_MANAGER_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mcp-manager")
}

/// MCP client configuration file the manager keeps in sync.
pub fn client_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("MCP_CLIENT_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gemini")
        .join("antigravity")
        .join("mcp_config.json")
}
