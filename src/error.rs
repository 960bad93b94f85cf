use thiserror::Error;

/// Bad caller input. Raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type Result<T> = std::result::Result<T, JiraError>;

#[derive(Debug, Error)]
pub enum JiraError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Jira credentials not configured")]
    NotConfigured,

    #[error("Jira resource not found: {0}")]
    NotFound(String),

    #[error("Jira API error ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Jira request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse Jira response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl JiraError {
    /// True when the failure is the caller's fault and can be fixed by
    /// changing the input.
    pub fn is_validation(&self) -> bool {
        matches!(self, JiraError::Validation(_))
    }
}
