use async_trait::async_trait;
use base64::Engine;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::IssueTracker;
use crate::config::JiraConfig;
use crate::error::{JiraError, Result};
use crate::model::issue::{CreatedIssue, Issue, NewIssue, Transition, User};
use crate::util::adf::paragraph_document;

const SEARCH_FIELDS: &[&str] = &[
    "summary",
    "status",
    "assignee",
    "priority",
    "created",
    "updated",
    "description",
    "issuetype",
    "comment",
];

/// Authenticated session against one Jira Cloud site.
pub struct JiraClient {
    api_base: String,
    agile_base: String,
    auth_header: String,
    default_project: String,
    client: reqwest::Client,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Self {
        let (email, api_token) = config.auth();
        let creds = format!("{email}:{api_token}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            api_base: config.api_base(),
            agile_base: config.agile_api_base(),
            auth_header: format!("Basic {encoded}"),
            default_project: config.project_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.api_base)
    }

    /// Send and classify: 404 is `NotFound`, any other non-2xx is `Remote`.
    /// Returns the raw body so callers can decide how to parse it.
    async fn execute(&self, builder: RequestBuilder, what: &str) -> Result<String> {
        tracing::debug!(target: "jira", "{what}");
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(JiraError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(JiraError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let body = self.execute(builder, what).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn default_jql(&self) -> String {
        format!("project = {} ORDER BY created DESC", self.default_project)
    }

    async fn try_board_issues(&self, board_id: u64, jql: Option<&str>) -> Result<Vec<Issue>> {
        let mut url = format!("{}/board/{board_id}/issue", self.agile_base);
        if let Some(jql) = jql {
            url.push_str(&format!("?jql={}", urlencoding::encode(jql)));
        }
        let page: IssuePage = self
            .fetch(
                self.request(Method::GET, &url),
                &format!("board/{board_id}/issue"),
            )
            .await?;
        Ok(page.issues)
    }
}

#[derive(Deserialize)]
struct IssuePage {
    #[serde(default)]
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct TransitionPage {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn get_issue(&self, issue_key: &str) -> Result<Issue> {
        let endpoint = format!("issue/{issue_key}");
        self.fetch(self.request(Method::GET, &self.api_url(&endpoint)), &endpoint)
            .await
    }

    async fn get_issues(&self, jql: Option<&str>, max_results: usize) -> Result<Vec<Issue>> {
        let jql = match jql.map(str::trim) {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => self.default_jql(),
        };
        let payload = json!({
            "jql": jql,
            "maxResults": max_results,
            "fields": SEARCH_FIELDS,
        });
        let page: IssuePage = self
            .fetch(
                self.request(Method::POST, &self.api_url("search/jql"))
                    .json(&payload),
                "search/jql",
            )
            .await?;
        let mut issues = page.issues;
        issues.truncate(max_results);
        Ok(issues)
    }

    async fn get_board_issues(&self, board_id: u64, jql: Option<&str>) -> Vec<Issue> {
        match self.try_board_issues(board_id, jql).await {
            Ok(issues) => issues,
            Err(e) => {
                tracing::warn!(board_id, error = %e, "board fetch failed, returning no issues");
                Vec::new()
            }
        }
    }

    async fn get_transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
        let endpoint = format!("issue/{issue_key}/transitions");
        let page: TransitionPage = self
            .fetch(self.request(Method::GET, &self.api_url(&endpoint)), &endpoint)
            .await?;
        Ok(page.transitions)
    }

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> Result<()> {
        let endpoint = format!("issue/{issue_key}/transitions");
        let payload = json!({ "transition": { "id": transition_id } });
        self.execute(
            self.request(Method::POST, &self.api_url(&endpoint))
                .json(&payload),
            &endpoint,
        )
        .await?;
        tracing::info!(issue_key, transition_id, "issue transitioned");
        Ok(())
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let project = issue
            .project_key
            .clone()
            .unwrap_or_else(|| self.default_project.clone());

        let mut fields = json!({
            "project": { "key": project },
            "summary": issue.summary,
            "description": paragraph_document(&issue.description),
            "issuetype": { "name": issue.issue_type },
        });
        if let Some(priority) = &issue.priority {
            fields["priority"] = json!({ "name": priority });
        }
        if let Some(assignee) = &issue.assignee {
            fields["assignee"] = json!({ "accountId": assignee });
        }

        let created: CreatedIssue = self
            .fetch(
                self.request(Method::POST, &self.api_url("issue"))
                    .json(&json!({ "fields": fields })),
                "issue",
            )
            .await?;
        tracing::info!(key = %created.key, "issue created");
        Ok(created)
    }

    async fn add_comment(&self, issue_key: &str, text: &str) -> Result<()> {
        let endpoint = format!("issue/{issue_key}/comment");
        let payload = json!({ "body": paragraph_document(text) });
        self.execute(
            self.request(Method::POST, &self.api_url(&endpoint))
                .json(&payload),
            &endpoint,
        )
        .await?;
        tracing::info!(issue_key, "comment added");
        Ok(())
    }

    async fn search_users(&self, query: &str, max_results: usize) -> Result<Vec<User>> {
        let max = max_results.to_string();
        self.fetch(
            self.request(Method::GET, &self.api_url("user/search"))
                .query(&[("query", query), ("maxResults", max.as_str())]),
            "user/search",
        )
        .await
    }

    async fn server_info(&self) -> Result<Value> {
        self.fetch(
            self.request(Method::GET, &self.api_url("serverInfo")),
            "serverInfo",
        )
        .await
    }

    async fn myself(&self) -> Result<User> {
        self.fetch(self.request(Method::GET, &self.api_url("myself")), "myself")
            .await
    }
}
