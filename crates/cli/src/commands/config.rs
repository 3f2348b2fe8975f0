use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use taskdesk_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_OK};

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: EXIT_CONFIG,
                output: format!("config validation failed: {error}"),
            };
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult { exit_code: EXIT_OK, output: lines.join("\n") }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_token = config
        .agent
        .api_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    let keywords = if config.review.keywords.is_empty() {
        "<none>".to_string()
    } else {
        config.review.keywords.join(", ")
    };

    let seed = config.review.seed.map(|seed| seed.to_string()).unwrap_or_else(|| "<unset>".into());

    vec![
        Field {
            key_path: "agent.base_url",
            env_keys: &["TASKDESK_AGENT_BASE_URL"],
            value: config.agent.base_url.clone(),
        },
        Field {
            key_path: "agent.api_token",
            env_keys: &["TASKDESK_AGENT_API_TOKEN"],
            value: api_token,
        },
        Field {
            key_path: "agent.timeout_secs",
            env_keys: &["TASKDESK_AGENT_TIMEOUT_SECS"],
            value: config.agent.timeout_secs.to_string(),
        },
        Field {
            key_path: "channel.ws_base_url",
            env_keys: &["TASKDESK_CHANNEL_WS_BASE_URL"],
            value: config.channel.ws_base_url.clone(),
        },
        Field {
            key_path: "channel.display_name",
            env_keys: &["TASKDESK_CHANNEL_DISPLAY_NAME"],
            value: config.channel.display_name.clone(),
        },
        Field {
            key_path: "review.policy",
            env_keys: &["TASKDESK_REVIEW_POLICY"],
            value: config.review.policy.as_str().to_string(),
        },
        Field {
            key_path: "review.keywords",
            env_keys: &["TASKDESK_REVIEW_KEYWORDS"],
            value: keywords,
        },
        Field {
            key_path: "review.sample_threshold",
            env_keys: &["TASKDESK_REVIEW_SAMPLE_THRESHOLD"],
            value: config.review.sample_threshold.to_string(),
        },
        Field {
            key_path: "review.seed",
            env_keys: &["TASKDESK_REVIEW_SEED"],
            value: seed,
        },
        Field {
            key_path: "logging.level",
            env_keys: &["TASKDESK_LOGGING_LEVEL", "TASKDESK_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["TASKDESK_LOGGING_FORMAT", "TASKDESK_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("taskdesk.toml"), PathBuf::from("config/taskdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a recognisable prefix (`td-***`) and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
