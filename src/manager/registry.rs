use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const REGISTRY_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: default_version(),
            servers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub repository: String,
    /// Checkout directory, relative to the servers dir. Several entries may
    /// share one checkout.
    pub directory: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default = "default_env_template")]
    pub env_template: String,
    #[serde(default)]
    pub env_required: Vec<String>,
    /// Dependency install command, run inside the checkout.
    #[serde(default = "default_setup")]
    pub setup: Vec<String>,
    /// Self-test run after install. `null` in the registry disables it.
    #[serde(default = "default_test")]
    pub test: Option<Vec<String>>,
}

impl ServerEntry {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("No description")
    }
}

fn default_version() -> String {
    REGISTRY_VERSION.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_command() -> String {
    "uv".to_string()
}

fn default_env_template() -> String {
    ".env.example".to_string()
}

fn default_setup() -> Vec<String> {
    vec!["uv".to_string(), "sync".to_string()]
}

fn default_test() -> Option<Vec<String>> {
    Some(
        ["uv", "run", "pytest", "tests/", "-q"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

/// Read the registry, writing an empty one first if the file is missing.
pub fn load_registry(path: &Path) -> Result<Registry> {
    if !path.exists() {
        let registry = Registry::default();
        save_registry(path, &registry)?;
        tracing::info!(path = %path.display(), "created default registry");
        return Ok(registry);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry from {}", path.display()))?;
    let registry: Registry = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(registry)
}

pub fn save_registry(path: &Path, registry: &Registry) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(registry)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write registry to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_registry_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mcp-registry.json");

        let registry = load_registry(&path).unwrap();
        assert_eq!(registry, Registry::default());
        assert!(path.exists());

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["version"], "1.0");
        assert!(on_disk["servers"].as_object().unwrap().is_empty());
    }

    #[test]
    fn entry_defaults_fill_in() {
        let registry: Registry = serde_json::from_str(
            r#"{"servers": {"jira": {"repository": "https://git.example/jira.git", "directory": "jira"}}}"#,
        )
        .unwrap();
        let entry = &registry.servers["jira"];
        assert!(entry.enabled);
        assert_eq!(entry.command, "uv");
        assert_eq!(entry.env_template, ".env.example");
        assert_eq!(entry.setup, vec!["uv", "sync"]);
        assert_eq!(
            entry.test.as_deref(),
            Some(&["uv", "run", "pytest", "tests/", "-q"].map(String::from)[..])
        );
        assert_eq!(entry.description(), "No description");
        assert_eq!(registry.version, "1.0");
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp-registry.json");
        let mut registry = Registry::default();
        registry.servers.insert(
            "jira".into(),
            serde_json::from_str(
                r#"{"repository": "r", "directory": "d", "enabled": false, "env_required": ["JIRA_API_TOKEN"], "test": null}"#,
            )
            .unwrap(),
        );
        assert_eq!(registry.servers["jira"].test, None);
        save_registry(&path, &registry).unwrap();
        assert_eq!(load_registry(&path).unwrap(), registry);
    }

    #[test]
    fn corrupt_registry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp-registry.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_registry(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
