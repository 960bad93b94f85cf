//! MCP tool surface.
//!
//! Each tool validates its arguments, calls Jira through the shared
//! [`AppContext`] and answers with human-readable text. Validation problems
//! and system failures come back as tool errors with distinct prefixes.

pub mod ops;
pub mod render;

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::JiraError;
use crate::model::issue::NewIssue;

// ===================================================================
// Input structs
// ===================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListMyTasksInput {
    /// Agile board ID. Defaults to the configured board.
    pub board_id: Option<i64>,
    /// Maximum number of tasks to show (1-100, default 10).
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InspectTaskInput {
    /// Issue key in PROJECT-NUMBER form, e.g. "CRM-123".
    pub issue_key: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SafeMoveTaskInput {
    /// Issue key in PROJECT-NUMBER form, e.g. "CRM-123".
    pub issue_key: String,
    /// Destination status name, e.g. "In Progress". Case-insensitive.
    pub target_status: String,
    /// Optional comment posted before the move.
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTaskInput {
    pub summary: String,
    pub description: String,
    /// Issue type name (default "Task").
    pub issue_type: Option<String>,
    /// Project key. Defaults to the configured project.
    pub project_key: Option<String>,
    /// Priority name, e.g. "High".
    pub priority: Option<String>,
    /// Assignee account ID (see `search_colleague`).
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchIssuesInput {
    /// JQL query. Defaults to the configured project, newest first.
    pub jql: Option<String>,
    /// Maximum number of issues (1-100, default 10).
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchColleagueInput {
    /// Name or part of a name, e.g. "Hector".
    pub name: String,
}

// ===================================================================
// JiraTools: the MCP server handler
// ===================================================================

#[derive(Clone)]
pub struct JiraTools {
    ctx: Arc<AppContext>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for JiraTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraTools")
            .field("configured", &self.ctx.config().is_configured())
            .finish()
    }
}

impl JiraTools {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }
}

fn present(result: Result<String, JiraError>) -> Result<String, String> {
    result.map_err(|e| {
        if !e.is_validation() {
            tracing::warn!(error = %e, "tool call failed");
        }
        render::error(&e)
    })
}

#[tool_router]
impl JiraTools {
    #[tool(description = "📋 My Tasks - Show pending tasks assigned to you on a board")]
    async fn list_my_tasks(&self, params: Parameters<ListMyTasksInput>) -> Result<String, String> {
        let input = params.0;
        present(ops::list_my_tasks(&self.ctx, input.board_id, input.limit).await)
    }

    #[tool(description = "🔍 View Task Details - Status, priority, assignee, description snippet and last comment")]
    async fn inspect_task(&self, params: Parameters<InspectTaskInput>) -> Result<String, String> {
        present(ops::inspect_task(&self.ctx, &params.0.issue_key).await)
    }

    #[tool(description = "🔄 Move Task - Transition a task after checking the workflow allows it, \
        with an optional comment")]
    async fn safe_move_task(&self, params: Parameters<SafeMoveTaskInput>) -> Result<String, String> {
        let input = params.0;
        present(
            ops::safe_move_task(
                &self.ctx,
                &input.issue_key,
                &input.target_status,
                input.comment.as_deref(),
            )
            .await,
        )
    }

    #[tool(description = "✨ Create New Task - Add a task to the Jira project")]
    async fn create_task(&self, params: Parameters<CreateTaskInput>) -> Result<String, String> {
        let input = params.0;
        let new_issue = NewIssue {
            summary: input.summary,
            description: input.description,
            issue_type: input.issue_type.unwrap_or_else(|| "Task".to_string()),
            project_key: input.project_key,
            priority: input.priority,
            assignee: input.assignee,
        };
        present(ops::create_task(&self.ctx, new_issue).await)
    }

    #[tool(description = "🔎 Search Issues - Run a JQL query")]
    async fn search_issues(&self, params: Parameters<SearchIssuesInput>) -> Result<String, String> {
        let input = params.0;
        present(ops::search_issues(&self.ctx, input.jql.as_deref(), input.limit).await)
    }

    #[tool(description = "👥 Find Team Member - Look up a colleague's account ID by name")]
    async fn search_colleague(&self, params: Parameters<SearchColleagueInput>) -> Result<String, String> {
        present(ops::search_colleague(&self.ctx, &params.0.name).await)
    }

    #[tool(description = "🩺 System Status - Check configuration, connectivity and authentication")]
    async fn health_check(&self) -> Result<String, String> {
        Ok(ops::health_check(&self.ctx).await)
    }

    #[tool(description = "⚙️ Environment - Show the agent's configuration with secrets masked")]
    async fn show_environment(&self) -> Result<String, String> {
        Ok(ops::show_environment(&self.ctx))
    }
}

#[tool_handler]
impl ServerHandler for JiraTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Jira tools. Use list_my_tasks or search_issues to find work, \
                 inspect_task for details, safe_move_task to change status \
                 (it checks the workflow first), create_task to add work."
                    .into(),
            ),
            ..Default::default()
        }
    }
}
