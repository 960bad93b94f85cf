pub mod client;
pub mod transition;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::issue::{CreatedIssue, Digest, Issue, NewIssue, Transition, User};

pub use client::JiraClient;
pub use transition::{safe_transition, TransitionOutcome};

/// How many candidates the colleague lookup asks the server for.
pub const USER_SEARCH_LIMIT: usize = 10;

/// Operations the agent needs from the issue tracker.
///
/// `JiraClient` is the real implementation; tests swap in recording mocks.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_issue(&self, issue_key: &str) -> Result<Issue>;

    /// JQL search. `None` falls back to the default project, newest first.
    async fn get_issues(&self, jql: Option<&str>, max_results: usize) -> Result<Vec<Issue>>;

    /// Best effort: any failure yields an empty list instead of an error.
    async fn get_board_issues(&self, board_id: u64, jql: Option<&str>) -> Vec<Issue>;

    /// Always a fresh request. Transition ids go stale as the workflow moves.
    async fn get_transitions(&self, issue_key: &str) -> Result<Vec<Transition>>;

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> Result<()>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    async fn add_comment(&self, issue_key: &str, text: &str) -> Result<()>;

    async fn search_users(&self, query: &str, max_results: usize) -> Result<Vec<User>>;

    async fn server_info(&self) -> Result<serde_json::Value>;

    /// The account the credentials belong to.
    async fn myself(&self) -> Result<User>;

    async fn get_issue_digest(&self, issue_key: &str) -> Result<Digest> {
        let issue = self.get_issue(issue_key).await?;
        Ok(Digest::from_issue(&issue))
    }

    /// First active Atlassian account in server order, not the closest
    /// string match.
    async fn fuzzy_user_search(&self, query: &str) -> Result<Option<User>> {
        let users = self.search_users(query, USER_SEARCH_LIMIT).await?;
        Ok(users.into_iter().find(User::is_active_atlassian))
    }
}
