//! Tool bodies: validate, call the tracker through the context, render.

use crate::context::AppContext;
use crate::error::{Result, ValidationError};
use crate::health::{format_health_report, perform_health_check};
use crate::model::issue::NewIssue;
use crate::validate::{validate_board_id, validate_issue_key, validate_limit, validate_status};

use super::render;

pub const MAX_LIMIT: i64 = 100;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MY_TASKS_JQL: &str = "assignee = currentUser() AND statusCategory != Done";
pub const AGENT_COMMENT_PREFIX: &str = "🤖 [Agent]: ";

fn non_empty(value: &str, what: &str) -> std::result::Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(format!("{what} must be a non-empty string")));
    }
    Ok(value.to_string())
}

pub async fn list_my_tasks(ctx: &AppContext, board_id: Option<i64>, limit: Option<i64>) -> Result<String> {
    let board_id = match board_id {
        Some(id) => validate_board_id(id)?,
        None => ctx.config().default_board_id,
    };
    let limit = validate_limit(limit.unwrap_or(DEFAULT_LIMIT), MAX_LIMIT)?;

    let client = ctx.client()?;
    let issues = client.get_board_issues(board_id, Some(MY_TASKS_JQL)).await;
    Ok(render::task_list(board_id, &issues, limit))
}

pub async fn inspect_task(ctx: &AppContext, issue_key: &str) -> Result<String> {
    let issue_key = validate_issue_key(issue_key)?;
    let digest = ctx.issue_digest(&issue_key).await?;
    Ok(render::digest(&digest))
}

/// Optional comment first, then the safe transition. A rejected transition
/// is a normal result, not an error.
pub async fn safe_move_task(
    ctx: &AppContext,
    issue_key: &str,
    target_status: &str,
    comment: Option<&str>,
) -> Result<String> {
    let issue_key = validate_issue_key(issue_key)?;
    let target_status = validate_status(target_status)?;

    if let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) {
        ctx.add_comment(&issue_key, &format!("{AGENT_COMMENT_PREFIX}{comment}"))
            .await?;
    }

    let outcome = ctx.move_issue(&issue_key, &target_status).await?;
    Ok(render::transition(&outcome))
}

pub async fn create_task(ctx: &AppContext, mut new_issue: NewIssue) -> Result<String> {
    new_issue.summary = non_empty(&new_issue.summary, "Summary")?;
    if new_issue.issue_type.trim().is_empty() {
        new_issue.issue_type = "Task".to_string();
    }
    let client = ctx.client()?;
    let created = client.create_issue(&new_issue).await?;
    Ok(format!("✅ Created task {}: {}", created.key, new_issue.summary))
}

pub async fn search_issues(ctx: &AppContext, jql: Option<&str>, limit: Option<i64>) -> Result<String> {
    let limit = validate_limit(limit.unwrap_or(DEFAULT_LIMIT), MAX_LIMIT)?;
    let client = ctx.client()?;
    let jql = jql.map(str::trim).filter(|q| !q.is_empty());
    let issues = client.get_issues(jql, limit).await?;
    let shown = jql.map(String::from).unwrap_or_else(|| {
        format!("project = {} ORDER BY created DESC", ctx.config().project_key)
    });
    Ok(render::search_results(&shown, &issues))
}

pub async fn search_colleague(ctx: &AppContext, name: &str) -> Result<String> {
    let name = non_empty(name, "Name")?;
    let user = ctx.find_colleague(&name).await?;
    Ok(render::colleague(&name, user.as_ref()))
}

pub async fn health_check(ctx: &AppContext) -> String {
    let status = perform_health_check(ctx).await;
    format_health_report(&status)
}

pub fn show_environment(ctx: &AppContext) -> String {
    let config = ctx.config();
    let or_unset = |v: &str| {
        if v.is_empty() {
            "Not set".to_string()
        } else {
            v.to_string()
        }
    };
    [
        "🌍 **Current Environment Status:**".to_string(),
        format!("- JIRA_BASE_URL: {}", or_unset(&config.base_url)),
        format!("- JIRA_EMAIL: {}", or_unset(&config.email)),
        format!("- JIRA_API_TOKEN: {}", render::mask_secret(&config.api_token)),
        format!("- JIRA_PROJECT_KEY: {}", config.project_key),
        format!("- JIRA_DEFAULT_BOARD_ID: {}", config.default_board_id),
        format!(
            "- ENV: {}",
            std::env::var("ENV").unwrap_or_else(|_| "dev".to_string())
        ),
    ]
    .join("\n")
}
