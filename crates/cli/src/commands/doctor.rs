use pollbot_core::config::{AppConfig, LoadOptions};
use pollbot_slack::api::{SlackApi, WebApiClient};
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::commands::config::redact_token;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

impl CheckStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return format!("{:#}", render_json(&report));
    }

    render_human(&report)
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match WebApiClient::from_config(&config.slack) {
                Ok(client) => {
                    checks.push(DoctorCheck {
                        name: "slack_client",
                        status: CheckStatus::Pass,
                        details: format!(
                            "web api client targets `{}` with a {}s timeout",
                            config.slack.api_base_url, config.slack.timeout_secs
                        ),
                    });
                    checks.push(check_slack_token(&config, &client));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "slack_client",
                        status: CheckStatus::Fail,
                        details: format!("failed to build web api client: {error}"),
                    });
                    checks.push(DoctorCheck::skipped(
                        "slack_token_readiness",
                        "the web api client could not be built",
                    ));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["slack_client", "slack_token_readiness"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Calls `auth.test` so a revoked or mistyped token fails here rather than
/// on the first poll.
fn check_slack_token(config: &AppConfig, client: &WebApiClient) -> DoctorCheck {
    let token = redact_token(config.slack.bot_token.expose_secret());
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "slack_token_readiness",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            }
        }
    };

    match runtime.block_on(client.auth_test()) {
        Ok(identity) => DoctorCheck {
            name: "slack_token_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "bot token `{token}` authenticated as `{}` in team `{}`",
                identity.user_id, identity.team
            ),
        },
        Err(error) => DoctorCheck {
            name: "slack_token_readiness",
            status: CheckStatus::Fail,
            details: format!("bot token `{token}` rejected by auth.test: {error}"),
        },
    }
}

fn render_json(report: &DoctorReport) -> Value {
    let checks: Vec<Value> = report
        .checks
        .iter()
        .map(|check| {
            json!({
                "name": check.name,
                "status": check.status.as_str(),
                "details": check.details,
            })
        })
        .collect();

    json!({
        "overall_status": report.overall_status.as_str(),
        "summary": report.summary,
        "checks": checks,
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
