//! Plain-text rendering of tool results.

use crate::error::JiraError;
use crate::jira::TransitionOutcome;
use crate::model::issue::{Digest, Issue, User};

pub fn issue_line(issue: &Issue) -> String {
    format!(
        "- [{}] {} ({})",
        issue.key,
        issue.summary(),
        issue.status_name()
    )
}

pub fn task_list(board_id: u64, issues: &[Issue], limit: usize) -> String {
    if issues.is_empty() {
        return "No pending tasks found.".to_string();
    }
    let mut lines = vec![format!("📋 PENDING TASKS (Board {board_id}):")];
    lines.extend(issues.iter().take(limit).map(issue_line));
    lines.join("\n")
}

pub fn search_results(jql: &str, issues: &[Issue]) -> String {
    if issues.is_empty() {
        return format!("No issues match '{jql}'.");
    }
    let mut lines = vec![format!("🔎 {} ISSUES for '{jql}':", issues.len())];
    lines.extend(issues.iter().map(issue_line));
    lines.join("\n")
}

pub fn digest(d: &Digest) -> String {
    format!(
        "🆔 {} | {} | {}\n👤 Assigned: {}\n📝 Summary: {}\n📄 Desc Snippet: {}\n💬 Last Comment: {}",
        d.key,
        d.status,
        d.priority,
        d.assignee,
        d.summary,
        d.description_snippet,
        d.last_comment.as_deref().unwrap_or("No comments"),
    )
}

pub fn transition(outcome: &TransitionOutcome) -> String {
    match outcome {
        TransitionOutcome::Moved { message, .. } => format!("✅ {message}"),
        TransitionOutcome::IssueUnavailable => {
            format!("⛔ BLOCKER: {}", outcome.message())
        }
        TransitionOutcome::InvalidTransition {
            message,
            valid_transitions,
        } => format!(
            "⛔ BLOCKER: {message}\n💡 Valid transitions: {}",
            valid_transitions.join(", ")
        ),
        TransitionOutcome::ExecutionFailed { message } => {
            format!("⛔ BLOCKER: Execution Error: {message}")
        }
    }
}

pub fn colleague(query: &str, user: Option<&User>) -> String {
    match user {
        Some(u) => format!("Found: {} (ID: {})", u.display_name, u.account_id),
        None => format!("No active user found matching '{query}'"),
    }
}

/// Validation problems read as user mistakes; everything else as a system
/// failure.
pub fn error(err: &JiraError) -> String {
    if err.is_validation() {
        format!("⛔ Validation Error: {err}")
    } else {
        format!("System Error: {err}")
    }
}

pub fn mask_secret(value: &str) -> String {
    if value.is_empty() {
        "Not set".to_string()
    } else {
        let head: String = value.chars().take(4).collect();
        format!("{head}***")
    }
}
