//! `.env` files: `KEY=VALUE` lines, `#` comments, order preserved.

use anyhow::{Context, Result};
use std::path::Path;

pub type EnvVars = Vec<(String, String)>;

const SENSITIVE_MARKERS: &[&str] = &["TOKEN", "PASSWORD", "SECRET"];

pub fn parse_env(contents: &str) -> EnvVars {
    let mut vars: EnvVars = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        set(&mut vars, key.trim(), value.trim());
    }
    vars
}

/// Missing file reads as no variables.
pub fn read_env_file(path: &Path) -> Result<EnvVars> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_env(&contents))
}

pub fn get<'a>(vars: &'a EnvVars, key: &str) -> Option<&'a str> {
    vars.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Insert or replace in place, keeping the original position.
pub fn set(vars: &mut EnvVars, key: &str, value: &str) {
    match vars.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value.to_string(),
        None => vars.push((key.to_string(), value.to_string())),
    }
}

pub fn is_sensitive(var: &str) -> bool {
    SENSITIVE_MARKERS.iter().any(|m| var.contains(m))
}

/// Secrets show their first and last four characters, or `***` when short.
pub fn mask_value(var: &str, value: &str) -> String {
    if !is_sensitive(var) {
        return value.to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

/// Required variables first in registry order, then everything else under
/// an "Optional variables" heading.
pub fn render_env(server_name: &str, required: &[String], vars: &EnvVars) -> String {
    let mut out = format!(
        "# {server_name} - MCP Server Configuration\n# Managed by mcp-manager ({})\n\n",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    for var in required {
        if let Some(value) = get(vars, var) {
            out.push_str(&format!("{var}={value}\n"));
        }
    }
    let optional: Vec<&(String, String)> = vars
        .iter()
        .filter(|(k, _)| !required.contains(k))
        .collect();
    if !optional.is_empty() {
        out.push_str("\n# Optional variables\n");
        for (key, value) in optional {
            out.push_str(&format!("{key}={value}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let vars = parse_env(
            "# header\n\nJIRA_EMAIL = me@acme.io\nJIRA_API_TOKEN=abc=def\nnot a pair\n",
        );
        assert_eq!(
            vars,
            vec![
                ("JIRA_EMAIL".to_string(), "me@acme.io".to_string()),
                ("JIRA_API_TOKEN".to_string(), "abc=def".to_string()),
            ]
        );
    }

    #[test]
    fn later_duplicates_replace_in_place() {
        let vars = parse_env("A=1\nB=2\nA=3\n");
        assert_eq!(get(&vars, "A"), Some("3"));
        assert_eq!(vars[0].0, "A");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn masking() {
        assert_eq!(mask_value("JIRA_API_TOKEN", "ATATT3xFfGF0abcd"), "ATAT...abcd");
        assert_eq!(mask_value("DB_PASSWORD", "short"), "***");
        assert_eq!(mask_value("JIRA_EMAIL", "me@acme.io"), "me@acme.io");
    }

    #[test]
    fn render_orders_required_first() {
        let vars = parse_env("EXTRA=1\nJIRA_API_TOKEN=tok\nJIRA_EMAIL=me\n");
        let text = render_env("jira", &strings(&["JIRA_EMAIL", "JIRA_API_TOKEN"]), &vars);

        assert!(text.starts_with("# jira - MCP Server Configuration\n"));
        let email = text.find("JIRA_EMAIL=me").unwrap();
        let token = text.find("JIRA_API_TOKEN=tok").unwrap();
        let optional = text.find("# Optional variables\nEXTRA=1").unwrap();
        assert!(email < token && token < optional);

        // rendering then parsing keeps the values
        let reparsed = parse_env(&text);
        assert_eq!(get(&reparsed, "EXTRA"), Some("1"));
        assert_eq!(reparsed.len(), 3);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_env_file(&dir.path().join(".env")).unwrap().is_empty());
    }
}
