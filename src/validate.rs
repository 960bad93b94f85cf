//! Input checks for tool arguments. Pure functions, no I/O.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;

pub const MAX_STATUS_LEN: usize = 50;

/// `PROJECT-NUMBER`, e.g. `CRM-123`.
static ISSUE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Z]{1,10}-\d{1,10}$").expect("valid regex")
});

static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9 ]+$").expect("valid regex")
});

/// Trim and upper-case an issue key, then check it against `PROJECT-NUMBER`.
pub fn validate_issue_key(issue_key: &str) -> Result<String, ValidationError> {
    let key = issue_key.trim().to_uppercase();
    if key.is_empty() {
        return Err(ValidationError::new("Issue key must be a non-empty string"));
    }
    if !ISSUE_KEY_RE.is_match(&key) {
        return Err(ValidationError::new(format!(
            "Invalid issue key format: '{key}'. Expected format: PROJECT-NUMBER (e.g., 'CRM-123')"
        )));
    }
    Ok(key)
}

/// Trim a status name; letters, digits and spaces only, at most 50 chars.
pub fn validate_status(status: &str) -> Result<String, ValidationError> {
    let status = status.trim();
    if status.is_empty() {
        return Err(ValidationError::new("Status must be a non-empty string"));
    }
    if status.chars().count() > MAX_STATUS_LEN {
        return Err(ValidationError::new(format!(
            "Status name too long (max {MAX_STATUS_LEN} chars): '{status}'"
        )));
    }
    if !STATUS_RE.is_match(status) {
        return Err(ValidationError::new(format!(
            "Invalid status format: '{status}'. Only alphanumeric characters and spaces allowed"
        )));
    }
    Ok(status.to_string())
}

pub fn validate_board_id(board_id: i64) -> Result<u64, ValidationError> {
    if board_id < 1 {
        return Err(ValidationError::new(format!(
            "Board ID must be positive, got {board_id}"
        )));
    }
    Ok(board_id as u64)
}

pub fn validate_limit(limit: i64, max_limit: i64) -> Result<usize, ValidationError> {
    if limit < 1 {
        return Err(ValidationError::new(format!(
            "Limit must be at least 1, got {limit}"
        )));
    }
    if limit > max_limit {
        return Err(ValidationError::new(format!(
            "Limit cannot exceed {max_limit}, got {limit}"
        )));
    }
    Ok(limit as usize)
}
