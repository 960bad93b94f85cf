//! The MCP client's `mcpServers` configuration file.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

use super::envfile::{self, EnvVars};
use super::registry::{Registry, ServerEntry};
use super::ManagerPaths;

/// Launch entry for one server. `uv` launchers are pointed at the checkout
/// with `run --directory`; the registry env (or `PYTHONIOENCODING=utf-8`
/// when it has none) is overlaid with the checkout's `.env`, and
/// `PYTHONPATH` is always `.`.
pub fn launch_entry(entry: &ServerEntry, server_dir: &Path, dotenv: &EnvVars) -> Value {
    let mut args: Vec<String> = Vec::new();
    if entry.command == "uv" {
        args.push("run".to_string());
        args.push("--directory".to_string());
        args.push(server_dir.display().to_string());
    }
    args.extend(entry.args.iter().cloned());

    let mut env = Map::new();
    if entry.env.is_empty() {
        env.insert("PYTHONIOENCODING".to_string(), json!("utf-8"));
    }
    for (key, value) in &entry.env {
        env.insert(key.clone(), Value::String(value.clone()));
    }
    for (key, value) in dotenv {
        env.insert(key.clone(), Value::String(value.clone()));
    }
    // module imports resolve from the checkout root
    env.insert("PYTHONPATH".to_string(), json!("."));

    json!({
        "command": entry.command,
        "args": args,
        "env": env,
    })
}

fn read_client_config(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({ "mcpServers": {} }));
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(value)
}

/// Write entries for every enabled, installed server. Keys outside
/// `mcpServers`, and servers the registry doesn't know, are left alone.
/// Returns the names that were written.
pub fn sync_client_config(paths: &ManagerPaths, registry: &Registry) -> Result<Vec<String>> {
    let mut config = read_client_config(&paths.client_config)?;
    if !config.is_object() {
        config = json!({});
    }
    let root = config
        .as_object_mut()
        .context("client config root is not an object")?;
    let servers = root
        .entry("mcpServers")
        .or_insert_with(|| Value::Object(Map::new()));
    if !servers.is_object() {
        *servers = Value::Object(Map::new());
    }
    let servers = servers
        .as_object_mut()
        .context("mcpServers is not an object")?;

    let mut written = Vec::new();
    for (name, entry) in &registry.servers {
        if !entry.enabled {
            continue;
        }
        let server_dir = paths.server_dir(entry);
        if !server_dir.exists() {
            tracing::warn!(server = %name, "skipping, not installed");
            continue;
        }
        let dotenv = envfile::read_env_file(&server_dir.join(".env"))?;
        servers.insert(name.clone(), launch_entry(entry, &server_dir, &dotenv));
        written.push(name.clone());
    }

    if let Some(parent) = paths.client_config.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&paths.client_config, serde_json::to_string_pretty(&config)?)
        .with_context(|| format!("Failed to write {}", paths.client_config.display()))?;
    tracing::info!(count = written.len(), path = %paths.client_config.display(), "client config synced");
    Ok(written)
}
