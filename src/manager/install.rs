use anyhow::{Context, Result};
use std::path::Path;

use super::envfile;
use super::registry::{Registry, ServerEntry};
use super::ManagerPaths;

/// What an install left for the user to do.
#[derive(Debug, Default, PartialEq)]
pub struct InstallReport {
    pub updated_existing: bool,
    pub env_created: bool,
    pub missing_required: Vec<String>,
    pub warnings: Vec<String>,
}

async fn run_command(cwd: &Path, argv: &[String]) -> Result<String> {
    let Some((program, args)) = argv.split_first() else {
        anyhow::bail!("empty command");
    };
    let output = tokio::process::Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .with_context(|| format!("Failed to run {}", argv.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{} failed: {}", argv.join(" "), stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn run_git(cwd: &Path, args: &[&str]) -> Result<()> {
    let argv: Vec<String> = std::iter::once("git")
        .chain(args.iter().copied())
        .map(String::from)
        .collect();
    run_command(cwd, &argv).await.map(|_| ())
}

async fn pull_latest(server_dir: &Path) -> Result<()> {
    run_git(server_dir, &["fetch", "origin"]).await?;
    run_git(server_dir, &["reset", "--hard", "origin/main"]).await
}

async fn run_setup(server_dir: &Path, entry: &ServerEntry) -> Result<()> {
    if entry.setup.is_empty() {
        return Ok(());
    }
    run_command(server_dir, &entry.setup).await.map(|_| ())
}

/// Copy the env template into `.env` unless one exists. Returns whether a
/// file was created.
fn prepare_env(server_dir: &Path, entry: &ServerEntry) -> Result<bool> {
    let env_path = server_dir.join(".env");
    let template = server_dir.join(&entry.env_template);
    if env_path.exists() || !template.exists() {
        return Ok(false);
    }
    std::fs::copy(&template, &env_path)
        .with_context(|| format!("Failed to copy {}", template.display()))?;
    Ok(true)
}

fn missing_required(server_dir: &Path, entry: &ServerEntry) -> Result<Vec<String>> {
    let vars = envfile::read_env_file(&server_dir.join(".env"))?;
    Ok(entry
        .env_required
        .iter()
        .filter(|var| envfile::get(&vars, var).map_or(true, str::is_empty))
        .cloned()
        .collect())
}

/// Clone (or update an existing checkout), install dependencies, seed
/// `.env` and run the optional self-test. Only a failed clone is fatal;
/// nothing is rolled back.
pub async fn install_server(paths: &ManagerPaths, name: &str, entry: &ServerEntry) -> Result<InstallReport> {
    let server_dir = paths.server_dir(entry);
    let mut report = InstallReport::default();

    if server_dir.exists() {
        report.updated_existing = true;
        if let Err(e) = pull_latest(&server_dir).await {
            tracing::warn!(server = %name, error = %e, "update of existing checkout failed");
            report.warnings.push(format!("update failed: {e}"));
        }
    } else {
        std::fs::create_dir_all(&paths.servers_dir)?;
        let target = server_dir.display().to_string();
        run_git(&paths.servers_dir, &["clone", &entry.repository, &target])
            .await
            .with_context(|| format!("Failed to clone {name}"))?;
    }

    if let Err(e) = run_setup(&server_dir, entry).await {
        tracing::warn!(server = %name, error = %e, "setup failed");
        report.warnings.push(format!("setup failed: {e}"));
    }

    report.env_created = prepare_env(&server_dir, entry)?;
    report.missing_required = missing_required(&server_dir, entry)?;

    if let Some(test) = &entry.test {
        if let Err(e) = run_command(&server_dir, test).await {
            tracing::warn!(server = %name, error = %e, "self-test failed");
            report.warnings.push(format!("test failed: {e}"));
        }
    }

    tracing::info!(server = %name, "installed");
    Ok(report)
}

/// Hard-reset the checkout to `origin/main`, then re-run setup.
pub async fn update_server(paths: &ManagerPaths, name: &str, entry: &ServerEntry) -> Result<()> {
    let server_dir = paths.server_dir(entry);
    if !server_dir.exists() {
        anyhow::bail!("Server '{name}' is not installed. Run: mcp-manager install {name}");
    }
    pull_latest(&server_dir)
        .await
        .with_context(|| format!("Failed to update {name}"))?;
    if let Err(e) = run_setup(&server_dir, entry).await {
        tracing::warn!(server = %name, error = %e, "setup failed");
    }
    tracing::info!(server = %name, "updated");
    Ok(())
}

/// Install every enabled server, moving on after failures. Returns the
/// names that failed.
pub async fn install_all(paths: &ManagerPaths, registry: &Registry) -> Vec<String> {
    let mut failed = Vec::new();
    for (name, entry) in registry.servers.iter().filter(|(_, e)| e.enabled) {
        println!("Installing {name}...");
        match install_server(paths, name, entry).await {
            Ok(report) => print_report(name, &report),
            Err(e) => {
                eprintln!("  Error: {e:#}");
                failed.push(name.clone());
            }
        }
    }
    failed
}

pub async fn update_all(paths: &ManagerPaths, registry: &Registry) -> Vec<String> {
    let mut failed = Vec::new();
    for (name, entry) in registry.servers.iter().filter(|(_, e)| e.enabled) {
        println!("Updating {name}...");
        match update_server(paths, name, entry).await {
            Ok(()) => println!("  Updated {name}"),
            Err(e) => {
                eprintln!("  Error: {e:#}");
                failed.push(name.clone());
            }
        }
    }
    failed
}

pub fn print_report(name: &str, report: &InstallReport) {
    for warning in &report.warnings {
        println!("  Warning: {warning}");
    }
    if report.env_created {
        println!("  Created .env from template");
    }
    if !report.missing_required.is_empty() {
        println!("  Required variables not set: {}", report.missing_required.join(", "));
        println!("  Run: mcp-manager configure {name}");
    }
    println!("  Installed {name}");
}
