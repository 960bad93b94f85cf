//! Safe workflow transitions.
//!
//! One invocation fetches the issue's legal transitions, matches the target
//! status by destination name, and applies at most one transition id taken
//! from that same fetch. Nothing is retried and nothing is cached.

use serde_json::{json, Value};

use super::IssueTracker;
use crate::model::issue::Transition;

pub const ERR_UNAVAILABLE: &str = "Issue Not Found or No Permission";
pub const ERR_INVALID: &str = "Invalid Transition";
pub const ERR_EXECUTION: &str = "Execution Error";

/// Result of a transition attempt. Failures are values, not errors: callers
/// branch on `is_success` rather than on `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Moved {
        message: String,
        new_status: String,
    },
    /// The transition list could not be fetched.
    IssueUnavailable,
    InvalidTransition {
        message: String,
        valid_transitions: Vec<String>,
    },
    ExecutionFailed {
        message: String,
    },
}

impl TransitionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransitionOutcome::Moved { .. })
    }

    pub fn error(&self) -> Option<&'static str> {
        match self {
            TransitionOutcome::Moved { .. } => None,
            TransitionOutcome::IssueUnavailable => Some(ERR_UNAVAILABLE),
            TransitionOutcome::InvalidTransition { .. } => Some(ERR_INVALID),
            TransitionOutcome::ExecutionFailed { .. } => Some(ERR_EXECUTION),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TransitionOutcome::Moved { message, .. }
            | TransitionOutcome::InvalidTransition { message, .. }
            | TransitionOutcome::ExecutionFailed { message } => message,
            TransitionOutcome::IssueUnavailable => ERR_UNAVAILABLE,
        }
    }

    pub fn valid_transitions(&self) -> &[String] {
        match self {
            TransitionOutcome::InvalidTransition {
                valid_transitions, ..
            } => valid_transitions,
            _ => &[],
        }
    }

    /// `{success, error?, message?, new_status?, valid_transitions?}`
    pub fn to_json(&self) -> Value {
        let mut out = json!({ "success": self.is_success() });
        if let Some(error) = self.error() {
            out["error"] = json!(error);
        }
        match self {
            TransitionOutcome::Moved {
                message,
                new_status,
            } => {
                out["message"] = json!(message);
                out["new_status"] = json!(new_status);
            }
            TransitionOutcome::IssueUnavailable => {}
            TransitionOutcome::InvalidTransition {
                message,
                valid_transitions,
            } => {
                out["message"] = json!(message);
                out["valid_transitions"] = json!(valid_transitions);
            }
            TransitionOutcome::ExecutionFailed { message } => {
                out["message"] = json!(message);
            }
        }
        out
    }
}

/// First transition whose destination name equals `target`, ignoring case
/// and surrounding whitespace. Later duplicates are unreachable by name.
pub fn find_transition<'a>(transitions: &'a [Transition], target: &str) -> Option<&'a Transition> {
    let target = target.trim().to_lowercase();
    transitions
        .iter()
        .find(|t| t.to.name.to_lowercase() == target)
}

/// Destination names in server order, duplicates kept.
pub fn destination_names(transitions: &[Transition]) -> Vec<String> {
    transitions.iter().map(|t| t.to.name.clone()).collect()
}

pub async fn safe_transition(
    tracker: &dyn IssueTracker,
    issue_key: &str,
    target_status: &str,
) -> TransitionOutcome {
    let transitions = match tracker.get_transitions(issue_key).await {
        Ok(transitions) => transitions,
        Err(e) => {
            tracing::debug!(issue_key, error = %e, "transition lookup failed");
            return TransitionOutcome::IssueUnavailable;
        }
    };

    let Some(matched) = find_transition(&transitions, target_status) else {
        let valid = destination_names(&transitions);
        return TransitionOutcome::InvalidTransition {
            message: format!(
                "Cannot move '{issue_key}' to '{target_status}'. Legal transitions are: {}",
                valid.join(", ")
            ),
            valid_transitions: valid,
        };
    };

    match tracker.transition_issue(issue_key, &matched.id).await {
        Ok(()) => TransitionOutcome::Moved {
            message: format!("Successfully moved '{issue_key}' to '{}'", matched.to.name),
            new_status: matched.to.name.clone(),
        },
        Err(e) => TransitionOutcome::ExecutionFailed {
            message: e.to_string(),
        },
    }
}
