//! Process-wide state handed to every tool call.
//!
//! Holds the single Jira client for the life of the process plus the TTL
//! caches. The client is built once, at startup, and only when the
//! configuration is complete. It is never rebuilt.

use std::sync::Arc;

use crate::cache::{CacheKey, TtlCache};
use crate::config::JiraConfig;
use crate::error::{JiraError, Result};
use crate::jira::{safe_transition, IssueTracker, JiraClient, TransitionOutcome};
use crate::model::issue::{Digest, User};

pub struct AppContext {
    config: JiraConfig,
    client: Option<Arc<dyn IssueTracker>>,
    users: TtlCache<CacheKey, User>,
    digests: TtlCache<CacheKey, Digest>,
}

impl AppContext {
    pub fn new(config: JiraConfig) -> Self {
        let client: Option<Arc<dyn IssueTracker>> = if config.is_configured() {
            Some(Arc::new(JiraClient::new(&config)))
        } else {
            None
        };
        Self::build(config, client)
    }

    /// Use an existing tracker instead of constructing a `JiraClient`.
    pub fn with_tracker(config: JiraConfig, tracker: Arc<dyn IssueTracker>) -> Self {
        Self::build(config, Some(tracker))
    }

    fn build(config: JiraConfig, client: Option<Arc<dyn IssueTracker>>) -> Self {
        Self {
            users: TtlCache::new(config.user_cache_ttl()),
            digests: TtlCache::new(config.digest_cache_ttl()),
            config,
            client,
        }
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    /// The shared client, or `NotConfigured` when credentials are missing.
    pub fn client(&self) -> Result<&Arc<dyn IssueTracker>> {
        if !self.config.is_configured() {
            return Err(JiraError::NotConfigured);
        }
        self.client.as_ref().ok_or(JiraError::NotConfigured)
    }

    pub async fn issue_digest(&self, issue_key: &str) -> Result<Digest> {
        let client = self.client()?;
        let key = CacheKey::IssueDigest {
            issue_key: issue_key.to_string(),
        };
        self.digests
            .get_or_try_insert_with(key, || client.get_issue_digest(issue_key))
            .await
    }

    /// Colleague lookup. Only hits are cached, so a user who shows up later
    /// is found on the next call.
    pub async fn find_colleague(&self, name: &str) -> Result<Option<User>> {
        let client = self.client()?;
        let key = CacheKey::UserSearch {
            query: name.trim().to_lowercase(),
        };
        if let Some(user) = self.users.get(&key) {
            return Ok(Some(user));
        }
        let found = client.fuzzy_user_search(name).await?;
        if let Some(user) = &found {
            self.users.set(key, user.clone());
        }
        Ok(found)
    }

    pub async fn add_comment(&self, issue_key: &str, text: &str) -> Result<()> {
        let client = self.client()?;
        client.add_comment(issue_key, text).await?;
        self.invalidate_issue(issue_key);
        Ok(())
    }

    pub async fn move_issue(&self, issue_key: &str, target_status: &str) -> Result<TransitionOutcome> {
        let client = self.client()?;
        let outcome = safe_transition(client.as_ref(), issue_key, target_status).await;
        tracing::debug!(issue_key, outcome = %outcome.to_json(), "transition attempted");
        if outcome.is_success() {
            self.invalidate_issue(issue_key);
        }
        Ok(outcome)
    }

    /// Drop the cached digest. A digest fetch already in flight for this
    /// issue will not be stored.
    pub fn invalidate_issue(&self, issue_key: &str) {
        self.digests.invalidate(&CacheKey::IssueDigest {
            issue_key: issue_key.to_string(),
        });
    }
}
