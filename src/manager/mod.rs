//! Install, update and configure a set of MCP servers listed in a JSON
//! registry, and keep an MCP client's configuration file in sync with them.

pub mod cli;
pub mod client_config;
pub mod envfile;
pub mod install;
pub mod registry;

use std::path::{Path, PathBuf};

use crate::config::{client_config_path, manager_home};

#[derive(Debug, Clone)]
pub struct ManagerPaths {
    pub registry: PathBuf,
    pub servers_dir: PathBuf,
    pub client_config: PathBuf,
}

impl ManagerPaths {
    pub fn from_env() -> Self {
        Self::rooted(&manager_home(), client_config_path())
    }

    pub fn rooted(home: &Path, client_config: PathBuf) -> Self {
        Self {
            registry: home.join("mcp-registry.json"),
            servers_dir: home.join("servers"),
            client_config,
        }
    }

    pub fn server_dir(&self, entry: &registry::ServerEntry) -> PathBuf {
        self.servers_dir.join(&entry.directory)
    }
}
