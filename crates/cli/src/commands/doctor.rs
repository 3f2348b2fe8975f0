use reqwest::Url;
use serde::Serialize;
use taskdesk_agent::HttpTaskListClient;
use taskdesk_core::config::{AppConfig, LoadOptions, ReviewPolicy};
use taskdesk_core::domain::catalog::{AgentBinding, Department};

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_OK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 4] =
    ["agent_endpoint", "channel_endpoints", "api_token", "review_policy"];

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { EXIT_OK } else { EXIT_CONFIG };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_agent_endpoint(&config));
            checks.push(check_channel_endpoints(&config));
            checks.push(check_api_token(&config));
            checks.push(check_review_policy(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(DEPENDENT_CHECKS.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
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

fn check_agent_endpoint(config: &AppConfig) -> DoctorCheck {
    let name = "agent_endpoint";
    let client = match HttpTaskListClient::new(&config.agent) {
        Ok(client) => client,
        Err(error) => return fail(name, error.to_string()),
    };

    let url = client.tasks_url();
    match check_url(&url, &["http", "https"]) {
        Ok(()) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("task lists from `{url}` (timeout {}s)", config.agent.timeout_secs),
        },
        Err(details) => fail(name, details),
    }
}

fn check_channel_endpoints(config: &AppConfig) -> DoctorCheck {
    let name = "channel_endpoints";
    let mut endpoints = Vec::new();
    for department in Department::ALL {
        for tool in department.tools() {
            let binding = match AgentBinding::new(department, None, None, *tool) {
                Ok(binding) => binding,
                Err(error) => return fail(name, error.to_string()),
            };
            let endpoint = binding.endpoint_url(&config.channel.ws_base_url);
            if let Err(details) = check_url(&endpoint, &["ws", "wss"]) {
                return fail(name, details);
            }
            endpoints.push(format!("{tool} -> {endpoint}"));
        }
    }

    DoctorCheck { name, status: CheckStatus::Pass, details: endpoints.join("; ") }
}

fn check_api_token(config: &AppConfig) -> DoctorCheck {
    let details = if config.agent.has_api_token() {
        "bearer token configured for task and channel requests"
    } else {
        "no api token configured; requests are sent without authorization"
    };
    DoctorCheck { name: "api_token", status: CheckStatus::Pass, details: details.to_string() }
}

fn check_review_policy(config: &AppConfig) -> DoctorCheck {
    let review = &config.review;
    let details = match review.policy {
        ReviewPolicy::Keyword => {
            format!("keyword policy with {} keyword(s)", review.keywords.len())
        }
        ReviewPolicy::Always => "every reply is held for review".to_string(),
        ReviewPolicy::Never => "replies are never held for review".to_string(),
        ReviewPolicy::Sampled => match review.seed {
            Some(seed) => format!("sampled above {} (seed {seed})", review.sample_threshold),
            None => format!("sampled above {}", review.sample_threshold),
        },
    };
    DoctorCheck { name: "review_policy", status: CheckStatus::Pass, details }
}

fn fail(name: &'static str, details: String) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Fail, details }
}

fn check_url(url: &str, schemes: &[&str]) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|error| format!("`{url}` is not a valid url: {error}"))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(format!("`{url}` must use one of: {}", schemes.join(", ")));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("`{url}` has no usable host"));
    }
    if parsed.port_or_known_default().is_none() {
        return Err(format!("`{url}` has no usable port"));
    }
    Ok(())
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

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
