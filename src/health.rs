use serde::Serialize;

use crate::context::AppContext;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub config: bool,
    pub api_connectivity: bool,
    pub authentication: bool,
    /// Optional: a failed search does not make the agent unhealthy.
    pub permissions: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.config && self.api_connectivity && self.authentication
    }

    pub fn status_emoji(&self) -> &'static str {
        if self.is_healthy() {
            "✅"
        } else {
            "⛔"
        }
    }
}

/// Walk config, connectivity, authentication and permissions in order,
/// stopping at the first mandatory step that fails.
pub async fn perform_health_check(ctx: &AppContext) -> HealthStatus {
    let mut status = HealthStatus {
        config: ctx.config().is_configured(),
        ..HealthStatus::default()
    };
    let Ok(client) = ctx.client() else {
        return status;
    };

    if let Err(e) = client.server_info().await {
        tracing::warn!(error = %e, "health check: server unreachable");
        return status;
    }
    status.api_connectivity = true;

    if let Err(e) = client.myself().await {
        tracing::warn!(error = %e, "health check: authentication failed");
        return status;
    }
    status.authentication = true;

    status.permissions = client
        .get_issues(Some("project is not EMPTY"), 1)
        .await
        .is_ok();
    status
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

pub fn format_health_report(status: &HealthStatus) -> String {
    let mut report = vec![
        format!("{} **Jira Agent Health Check**", status.status_emoji()),
        String::new(),
        format!(
            "Overall Status: {}",
            if status.is_healthy() { "HEALTHY" } else { "UNHEALTHY" }
        ),
        String::new(),
        "Component Status:".to_string(),
        format!("  {} Configuration", mark(status.config)),
        format!("  {} API Connectivity", mark(status.api_connectivity)),
        format!("  {} Authentication", mark(status.authentication)),
        format!(
            "  {} Permissions (optional)",
            if status.permissions { "✅" } else { "⚠️" }
        ),
    ];

    if !status.is_healthy() {
        report.push(String::new());
        report.push("💡 Troubleshooting:".to_string());
        if !status.config {
            report.push(
                "  - Check that JIRA_BASE_URL, JIRA_EMAIL, and JIRA_API_TOKEN are set".to_string(),
            );
        }
        if !status.api_connectivity {
            report.push("  - Verify network connection to Jira server".to_string());
            report.push("  - Check that JIRA_BASE_URL is correct".to_string());
        }
        if !status.authentication {
            report.push("  - Verify JIRA_EMAIL and JIRA_API_TOKEN are correct".to_string());
            report.push("  - Check that the token hasn't expired".to_string());
        }
    }

    report.join("\n")
}
