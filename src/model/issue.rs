use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::adf::{extract_text_from_adf, paragraph_texts};

pub const DESCRIPTION_SNIPPET_LEN: usize = 300;
pub const NO_DESCRIPTION: &str = "No description";
pub const COMPLEX_DESCRIPTION: &str = "Complex content";
pub const UNPARSED_COMMENT: &str = "Rich text comment (could not parse)";
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    pub description: Option<Value>,
    pub status: Option<NamedField>,
    pub priority: Option<NamedField>,
    pub assignee: Option<UserRef>,
    pub issuetype: Option<NamedField>,
    pub comment: Option<CommentPage>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub display_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub body: Option<Value>,
    pub author: Option<UserRef>,
    pub created: Option<String>,
}

impl Issue {
    pub fn summary(&self) -> &str {
        self.fields.summary.as_deref().unwrap_or("No summary")
    }

    pub fn status_name(&self) -> &str {
        self.fields
            .status
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn priority_name(&self) -> &str {
        self.fields
            .priority
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("None")
    }

    pub fn assignee_name(&self) -> &str {
        self.fields
            .assignee
            .as_ref()
            .map(|a| a.display_name.as_str())
            .unwrap_or(UNASSIGNED)
    }
}

/// A legal workflow move, as returned by `issue/{key}/transitions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub to: TransitionTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionTarget {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub account_id: String,
    pub display_name: String,
    pub account_type: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub email_address: Option<String>,
}

impl User {
    /// Active human account (bots and customer accounts excluded).
    pub fn is_active_atlassian(&self) -> bool {
        self.active && self.account_type.as_deref() == Some("atlassian")
    }
}

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub project_key: Option<String>,
    pub priority: Option<String>,
    /// Account ID, not display name.
    pub assignee: Option<String>,
}

impl NewIssue {
    pub fn task(summary: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            issue_type: "Task".into(),
            project_key: None,
            priority: None,
            assignee: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

/// Condensed, display-oriented view of an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub description_snippet: String,
    pub comments_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_comment: Option<String>,
}

impl Digest {
    pub fn from_issue(issue: &Issue) -> Self {
        let comments = issue.fields.comment.as_ref();
        Digest {
            key: issue.key.clone(),
            summary: issue.summary().to_string(),
            status: issue.status_name().to_string(),
            priority: issue.priority_name().to_string(),
            assignee: issue.assignee_name().to_string(),
            description_snippet: description_snippet(issue.fields.description.as_ref()),
            comments_count: comments.map(|c| c.total).unwrap_or(0),
            last_comment: comments
                .and_then(|c| c.comments.last())
                .map(|c| comment_text(c.body.as_ref())),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Plain-string descriptions are cut without a marker; rich-text ones get
/// `...` when truncated. An empty document counts as no description.
pub fn description_snippet(description: Option<&Value>) -> String {
    match description {
        Some(Value::String(s)) => s.chars().take(DESCRIPTION_SNIPPET_LEN).collect(),
        Some(doc @ Value::Object(_)) if has_empty_content(doc) => NO_DESCRIPTION.to_string(),
        Some(doc @ Value::Object(_)) => match paragraph_texts(doc) {
            Some(parts) if !parts.is_empty() => {
                truncate(&parts.join(" "), DESCRIPTION_SNIPPET_LEN)
            }
            Some(_) => COMPLEX_DESCRIPTION.to_string(),
            None => NO_DESCRIPTION.to_string(),
        },
        _ => NO_DESCRIPTION.to_string(),
    }
}

fn has_empty_content(doc: &Value) -> bool {
    doc.get("content")
        .and_then(Value::as_array)
        .is_some_and(|blocks| blocks.is_empty())
}

fn comment_text(body: Option<&Value>) -> String {
    body.and_then(extract_text_from_adf)
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| UNPARSED_COMMENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue(fields: Value) -> Issue {
        serde_json::from_value(json!({ "key": "CRM-7", "fields": fields })).unwrap()
    }

    #[test]
    fn missing_fields_fall_back() {
        let issue = issue(json!({ "assignee": null, "priority": null }));
        assert_eq!(issue.summary(), "No summary");
        assert_eq!(issue.status_name(), "Unknown");
        assert_eq!(issue.priority_name(), "None");
        assert_eq!(issue.assignee_name(), "Unassigned");
    }

    #[test]
    fn digest_joins_paragraphs() {
        let issue = issue(json!({
            "summary": "Login broken",
            "status": {"name": "In Progress"},
            "priority": {"name": "High"},
            "assignee": {"displayName": "Hector", "accountId": "abc"},
            "description": {
                "type": "doc", "version": 1,
                "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "First part."}]},
                    {"type": "paragraph", "content": [{"type": "text", "text": "Second part."}]}
                ]
            }
        }));
        let digest = Digest::from_issue(&issue);
        assert_eq!(digest.description_snippet, "First part. Second part.");
        assert_eq!(digest.assignee, "Hector");
        assert_eq!(digest.status, "In Progress");
        assert_eq!(digest.comments_count, 0);
        assert_eq!(digest.last_comment, None);
    }

    #[test]
    fn digest_truncates_long_descriptions() {
        let first = "a".repeat(200);
        let second = "b".repeat(200);
        let description = json!({
            "type": "doc", "version": 1,
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": first}]},
                {"type": "paragraph", "content": [{"type": "text", "text": second}]}
            ]
        });
        let snippet = description_snippet(Some(&description));
        let expected = format!("{} {}...", "a".repeat(200), "b".repeat(99));
        assert_eq!(snippet, expected);
        assert_eq!(snippet.chars().count(), DESCRIPTION_SNIPPET_LEN + 3);
    }

    #[test]
    fn description_sentinels() {
        assert_eq!(description_snippet(None), NO_DESCRIPTION);
        assert_eq!(description_snippet(Some(&Value::Null)), NO_DESCRIPTION);
        assert_eq!(description_snippet(Some(&json!({"type": "doc"}))), NO_DESCRIPTION);
        assert_eq!(
            description_snippet(Some(&json!({"type": "doc", "content": [{"type": "table"}]}))),
            COMPLEX_DESCRIPTION
        );
        assert_eq!(
            description_snippet(Some(&json!({"type": "doc", "version": 1, "content": []}))),
            NO_DESCRIPTION
        );
        assert_eq!(description_snippet(Some(&json!("plain text"))), "plain text");
    }

    #[test]
    fn plain_string_description_is_cut_without_marker() {
        let long = "x".repeat(DESCRIPTION_SNIPPET_LEN + 50);
        let snippet = description_snippet(Some(&Value::String(long)));
        assert_eq!(snippet, "x".repeat(DESCRIPTION_SNIPPET_LEN));
    }

    #[test]
    fn digest_takes_most_recent_comment() {
        let issue = issue(json!({
            "comment": {
                "total": 2,
                "comments": [
                    {"body": {"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "older"}]}]}},
                    {"body": {"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "newest"}]}]}}
                ]
            }
        }));
        let digest = Digest::from_issue(&issue);
        assert_eq!(digest.comments_count, 2);
        assert_eq!(digest.last_comment.as_deref(), Some("newest"));
    }

    #[test]
    fn unparseable_comment_uses_sentinel() {
        let issue = issue(json!({
            "comment": {"total": 1, "comments": [{"body": {"type": "doc", "content": [{"type": "mediaSingle"}]}}]}
        }));
        assert_eq!(
            Digest::from_issue(&issue).last_comment.as_deref(),
            Some(UNPARSED_COMMENT)
        );
    }

    #[test]
    fn user_qualification() {
        let user: User = serde_json::from_value(json!({
            "accountId": "1", "displayName": "Bot", "accountType": "app", "active": true
        }))
        .unwrap();
        assert!(!user.is_active_atlassian());
    }
}
