use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::Path;

use super::client_config::sync_client_config;
use super::envfile::{self, EnvVars};
use super::install;
use super::registry::{load_registry, Registry, ServerEntry};
use super::ManagerPaths;

#[derive(Debug, Parser)]
#[command(name = "mcp-manager", version, about = "Install and configure MCP servers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered servers
    List,
    /// Install one server
    Install { name: String },
    /// Install every enabled server
    InstallAll,
    /// Update one server to origin/main
    Update { name: String },
    /// Update every enabled server
    UpdateAll,
    /// Show a server's environment with secrets masked
    ShowConfig { name: String },
    /// Set environment variables for a server (prompts when none given)
    Configure {
        name: String,
        #[arg(value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
    },
    /// Regenerate the MCP client configuration
    #[command(alias = "config")]
    SyncClient,
}

/// Parse a `KEY=VALUE` argument.
pub fn parse_key_val(arg: &str) -> std::result::Result<(String, String), String> {
    let Some((key, value)) = arg.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{arg}'"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing variable name in '{arg}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(cli: Cli, paths: &ManagerPaths) -> Result<()> {
    let registry = load_registry(&paths.registry)?;

    match cli.command {
        Command::List => print!("{}", render_list(paths, &registry)),
        Command::Install { name } => {
            let entry = lookup(&registry, &name)?;
            println!("Installing {name}...");
            let report = install::install_server(paths, &name, entry).await?;
            install::print_report(&name, &report);
            sync_and_report(paths, &registry)?;
        }
        Command::InstallAll => {
            let failed = install::install_all(paths, &registry).await;
            report_failures("install", &failed);
            sync_and_report(paths, &registry)?;
        }
        Command::Update { name } => {
            let entry = lookup(&registry, &name)?;
            install::update_server(paths, &name, entry).await?;
            println!("Updated {name}");
            sync_and_report(paths, &registry)?;
        }
        Command::UpdateAll => {
            let failed = install::update_all(paths, &registry).await;
            report_failures("update", &failed);
            sync_and_report(paths, &registry)?;
        }
        Command::ShowConfig { name } => {
            let entry = lookup(&registry, &name)?;
            let server_dir = paths.server_dir(entry);
            let vars = envfile::read_env_file(&server_dir.join(".env"))?;
            print!("{}", render_show_config(&name, entry, &server_dir, &vars));
        }
        Command::Configure { name, vars } => {
            let entry = lookup(&registry, &name)?;
            let server_dir = paths.server_dir(entry);
            if !server_dir.exists() {
                bail!("Server '{name}' is not installed. Run: mcp-manager install {name}");
            }
            let env_path = server_dir.join(".env");
            let current = envfile::read_env_file(&env_path)?;
            let updates = if vars.is_empty() {
                let stdin = std::io::stdin();
                prompt_for_required(&entry.env_required, &current, stdin.lock(), std::io::stdout())?
            } else {
                vars
            };
            let merged = configure(&name, entry, &env_path, current, &updates)?;
            println!("Saved {} variables to {}", merged.len(), env_path.display());
            sync_and_report(paths, &registry)?;
        }
        Command::SyncClient => sync_and_report(paths, &registry)?,
    }
    Ok(())
}

fn lookup<'a>(registry: &'a Registry, name: &str) -> Result<&'a ServerEntry> {
    registry
        .servers
        .get(name)
        .with_context(|| format!("Unknown server '{name}'. Run: mcp-manager list"))
}

fn sync_and_report(paths: &ManagerPaths, registry: &Registry) -> Result<()> {
    let written = sync_client_config(paths, registry)?;
    println!(
        "Client config updated ({} servers): {}",
        written.len(),
        paths.client_config.display()
    );
    Ok(())
}

fn report_failures(action: &str, failed: &[String]) {
    if !failed.is_empty() {
        eprintln!("Failed to {action}: {}", failed.join(", "));
    }
}

pub fn render_list(paths: &ManagerPaths, registry: &Registry) -> String {
    if registry.servers.is_empty() {
        return format!("No servers registered in {}\n", paths.registry.display());
    }
    let mut out = String::from("Registered MCP servers:\n");
    for (name, entry) in &registry.servers {
        let server_dir = paths.server_dir(entry);
        let enabled = if entry.enabled { "enabled" } else { "disabled" };
        let installed = if server_dir.exists() { "installed" } else { "not installed" };
        out.push_str(&format!("\n  {name} [{enabled}, {installed}]\n"));
        out.push_str(&format!("    {}\n", entry.description()));
        out.push_str(&format!("    repo: {}\n", entry.repository));
        out.push_str(&format!("    path: {}\n", server_dir.display()));
    }
    out
}

pub fn render_show_config(name: &str, entry: &ServerEntry, server_dir: &Path, vars: &EnvVars) -> String {
    let mut out = format!("Configuration for {name}\n\nRequired:\n");
    for var in &entry.env_required {
        match envfile::get(vars, var).filter(|v| !v.is_empty()) {
            Some(value) => out.push_str(&format!("  {var}={}\n", envfile::mask_value(var, value))),
            None => out.push_str(&format!("  {var}=(not set)\n")),
        }
    }
    let optional: Vec<_> = vars
        .iter()
        .filter(|(k, _)| !entry.env_required.contains(k))
        .collect();
    if !optional.is_empty() {
        out.push_str("\nOther:\n");
        for (key, value) in optional {
            out.push_str(&format!("  {key}={}\n", envfile::mask_value(key, value)));
        }
    }
    out.push_str(&format!("\nEnv file: {}\n", server_dir.join(".env").display()));
    out.push_str(&format!("Template: {}\n", server_dir.join(&entry.env_template).display()));
    out
}

/// Ask for each required variable; an empty answer keeps the current value.
pub fn prompt_for_required<R: BufRead, W: Write>(
    required: &[String],
    current: &EnvVars,
    mut input: R,
    mut output: W,
) -> Result<EnvVars> {
    let mut answers = Vec::new();
    for var in required {
        match envfile::get(current, var).filter(|v| !v.is_empty()) {
            Some(value) => write!(output, "{var} [{}]: ", envfile::mask_value(var, value))?,
            None => write!(output, "{var}: ")?,
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if !line.is_empty() {
            answers.push((var.clone(), line.to_string()));
        }
    }
    Ok(answers)
}

/// Merge updates into the current values and rewrite the `.env`.
pub fn configure(
    name: &str,
    entry: &ServerEntry,
    env_path: &Path,
    mut current: EnvVars,
    updates: &EnvVars,
) -> Result<EnvVars> {
    for (key, value) in updates {
        envfile::set(&mut current, key, value);
    }
    let contents = envfile::render_env(name, &entry.env_required, &current);
    std::fs::write(env_path, contents)
        .with_context(|| format!("Failed to write {}", env_path.display()))?;
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn entry() -> ServerEntry {
        serde_json::from_value(serde_json::json!({
            "description": "Jira agent",
            "repository": "https://git.example/jira.git",
            "directory": "jira",
            "env_required": ["JIRA_EMAIL", "JIRA_API_TOKEN"],
        }))
        .unwrap()
    }

    #[test]
    fn parse_key_val_cases() {
        assert_eq!(
            parse_key_val("JIRA_API_TOKEN=a=b").unwrap(),
            ("JIRA_API_TOKEN".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_key_val("EMPTY=").unwrap().1, "");
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["mcp-manager", "configure", "jira", "A=1", "B=2"]).unwrap();
        match cli.command {
            Command::Configure { name, vars } => {
                assert_eq!(name, "jira");
                assert_eq!(vars.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            Cli::try_parse_from(["mcp-manager", "install-all"]).unwrap().command,
            Command::InstallAll
        ));
        assert!(matches!(
            Cli::try_parse_from(["mcp-manager", "config"]).unwrap().command,
            Command::SyncClient
        ));
        assert!(Cli::try_parse_from(["mcp-manager", "configure", "jira", "bad"]).is_err());
    }

    #[test]
    fn show_config_masks_secrets() {
        let vars = envfile::parse_env("JIRA_API_TOKEN=ATATT3xFfGF0abcd\nJIRA_DB_SECRET=short\nLOG=debug\n");
        let text = render_show_config("jira", &entry(), Path::new("/srv/jira"), &vars);

        assert!(text.contains("  JIRA_EMAIL=(not set)\n"));
        assert!(text.contains("  JIRA_API_TOKEN=ATAT...abcd\n"));
        assert!(text.contains("  JIRA_DB_SECRET=***\n"));
        assert!(text.contains("  LOG=debug\n"));
        assert!(text.contains("Env file: /srv/jira/.env"));
        assert!(!text.contains("3xFfGF0"));
    }

    #[test]
    fn list_marks_install_state() {
        let home = tempfile::tempdir().unwrap();
        let paths = ManagerPaths::rooted(home.path(), home.path().join("mcp.json"));
        let mut registry = Registry::default();
        registry.servers.insert("jira".into(), entry());

        let text = render_list(&paths, &registry);
        assert!(text.contains("jira [enabled, not installed]"));
        assert!(text.contains("Jira agent"));

        std::fs::create_dir_all(paths.servers_dir.join("jira")).unwrap();
        assert!(render_list(&paths, &registry).contains("jira [enabled, installed]"));

        assert!(render_list(&paths, &Registry::default()).starts_with("No servers registered"));
    }

    #[test]
    fn prompts_keep_current_on_blank_answer() {
        let current = envfile::parse_env("JIRA_EMAIL=old@acme.io\n");
        let required = vec!["JIRA_EMAIL".to_string(), "JIRA_API_TOKEN".to_string()];
        let mut out = Vec::new();

        let answers =
            prompt_for_required(&required, &current, Cursor::new("\nnew-token\n"), &mut out).unwrap();
        assert_eq!(answers, vec![("JIRA_API_TOKEN".to_string(), "new-token".to_string())]);

        let prompts = String::from_utf8(out).unwrap();
        assert!(prompts.contains("JIRA_EMAIL [old@acme.io]: "));
        assert!(prompts.contains("JIRA_API_TOKEN: "));
    }

    #[test]
    fn configure_merges_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        let current = envfile::parse_env("LOG=debug\nJIRA_EMAIL=old@acme.io\n");
        let updates = vec![
            ("JIRA_API_TOKEN".to_string(), "tok".to_string()),
            ("JIRA_EMAIL".to_string(), "me@acme.io".to_string()),
        ];

        let merged = configure("jira", &entry(), &env_path, current, &updates).unwrap();
        assert_eq!(envfile::get(&merged, "LOG"), Some("debug"));

        let text = std::fs::read_to_string(&env_path).unwrap();
        let email = text.find("JIRA_EMAIL=me@acme.io").unwrap();
        let token = text.find("JIRA_API_TOKEN=tok").unwrap();
        let optional = text.find("# Optional variables\nLOG=debug").unwrap();
        assert!(email < token && token < optional);
    }
}
