use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub channel: ChannelConfig,
    pub review: ReviewConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub base_url: String,
    pub api_token: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub ws_base_url: String,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReviewConfig {
    pub policy: ReviewPolicy,
    pub keywords: Vec<String>,
    pub sample_threshold: f64,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPolicy {
    Keyword,
    Always,
    Never,
    Sampled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub agent_base_url: Option<String>,
    pub agent_api_token: Option<String>,
    pub ws_base_url: Option<String>,
    pub display_name: Option<String>,
    pub review_policy: Option<ReviewPolicy>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_REVIEW_KEYWORDS: [&str; 6] =
    ["delete", "drop table", "force push", "rm -rf", "password", "secret"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig {
                base_url: "http://localhost:8000".to_string(),
                api_token: None,
                timeout_secs: 30,
            },
            channel: ChannelConfig {
                ws_base_url: "ws://localhost:8000".to_string(),
                display_name: "User".to_string(),
            },
            review: ReviewConfig {
                policy: ReviewPolicy::Keyword,
                keywords: DEFAULT_REVIEW_KEYWORDS.iter().map(ToString::to_string).collect(),
                sample_threshold: 0.7,
                seed: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ReviewPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "sampled" => Ok(Self::Sampled),
            other => Err(ConfigError::Validation(format!(
                "unsupported review policy `{other}` (expected keyword|always|never|sampled)"
            ))),
        }
    }
}

impl ReviewPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Always => "always",
            Self::Never => "never",
            Self::Sampled => "sampled",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AgentConfig {
    pub fn has_api_token(&self) -> bool {
        self.api_token.as_ref().is_some_and(|token| !token.expose_secret().trim().is_empty())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("taskdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(agent) = patch.agent {
            if let Some(base_url) = agent.base_url {
                self.agent.base_url = base_url;
            }
            if let Some(api_token) = agent.api_token {
                self.agent.api_token = Some(secret_value(api_token));
            }
            if let Some(timeout_secs) = agent.timeout_secs {
                self.agent.timeout_secs = timeout_secs;
            }
        }

        if let Some(channel) = patch.channel {
            if let Some(ws_base_url) = channel.ws_base_url {
                self.channel.ws_base_url = ws_base_url;
            }
            if let Some(display_name) = channel.display_name {
                self.channel.display_name = display_name;
            }
        }

        if let Some(review) = patch.review {
            if let Some(policy) = review.policy {
                self.review.policy = policy;
            }
            if let Some(keywords) = review.keywords {
                self.review.keywords = keywords;
            }
            if let Some(sample_threshold) = review.sample_threshold {
                self.review.sample_threshold = sample_threshold;
            }
            if let Some(seed) = review.seed {
                self.review.seed = Some(seed);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TASKDESK_AGENT_BASE_URL") {
            self.agent.base_url = value;
        }
        if let Some(value) = read_env("TASKDESK_AGENT_API_TOKEN") {
            self.agent.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("TASKDESK_AGENT_TIMEOUT_SECS") {
            self.agent.timeout_secs = parse_u64("TASKDESK_AGENT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TASKDESK_CHANNEL_WS_BASE_URL") {
            self.channel.ws_base_url = value;
        }
        if let Some(value) = read_env("TASKDESK_CHANNEL_DISPLAY_NAME") {
            self.channel.display_name = value;
        }

        if let Some(value) = read_env("TASKDESK_REVIEW_POLICY") {
            self.review.policy = value.parse()?;
        }
        if let Some(value) = read_env("TASKDESK_REVIEW_KEYWORDS") {
            self.review.keywords = value
                .split(',')
                .map(str::trim)
                .filter(|keyword| !keyword.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = read_env("TASKDESK_REVIEW_SAMPLE_THRESHOLD") {
            self.review.sample_threshold = parse_f64("TASKDESK_REVIEW_SAMPLE_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("TASKDESK_REVIEW_SEED") {
            self.review.seed = Some(parse_u64("TASKDESK_REVIEW_SEED", &value)?);
        }

        let log_level =
            read_env("TASKDESK_LOGGING_LEVEL").or_else(|| read_env("TASKDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TASKDESK_LOGGING_FORMAT").or_else(|| read_env("TASKDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.agent_base_url {
            self.agent.base_url = base_url;
        }
        if let Some(api_token) = overrides.agent_api_token {
            self.agent.api_token = Some(secret_value(api_token));
        }
        if let Some(ws_base_url) = overrides.ws_base_url {
            self.channel.ws_base_url = ws_base_url;
        }
        if let Some(display_name) = overrides.display_name {
            self.channel.display_name = display_name;
        }
        if let Some(policy) = overrides.review_policy {
            self.review.policy = policy;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_agent(&self.agent)?;
        validate_channel(&self.channel)?;
        validate_review(&self.review)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("taskdesk.toml"), PathBuf::from("config/taskdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    let base_url = agent.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "agent.base_url must start with http:// or https://".to_string(),
        ));
    }

    if agent.timeout_secs == 0 || agent.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "agent.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if let Some(token) = &agent.api_token {
        if token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "agent.api_token is set but empty; remove it or provide a token".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_channel(channel: &ChannelConfig) -> Result<(), ConfigError> {
    let ws_base_url = channel.ws_base_url.trim();
    if !ws_base_url.starts_with("ws://") && !ws_base_url.starts_with("wss://") {
        let hint = if ws_base_url.starts_with("http") {
            " (hint: use ws:// or wss:// instead of http:// or https://)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "channel.ws_base_url must start with ws:// or wss://{hint}"
        )));
    }

    if channel.display_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "channel.display_name must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_review(review: &ReviewConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&review.sample_threshold) {
        return Err(ConfigError::Validation(
            "review.sample_threshold must be in range 0.0..=1.0".to_string(),
        ));
    }

    if review.policy == ReviewPolicy::Keyword
        && review.keywords.iter().all(|keyword| keyword.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "review.policy = \"keyword\" requires at least one entry in review.keywords"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    agent: Option<AgentPatch>,
    channel: Option<ChannelPatch>,
    review: Option<ReviewPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelPatch {
    ws_base_url: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewPatch {
    policy: Option<ReviewPolicy>,
    keywords: Option<Vec<String>>,
    sample_threshold: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, ReviewPolicy};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_any_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        ensure(config.agent.base_url == "http://localhost:8000", "default agent url")?;
        ensure(config.channel.ws_base_url == "ws://localhost:8000", "default websocket url")?;
        ensure(config.channel.display_name == "User", "default display name")?;
        ensure(config.review.policy == ReviewPolicy::Keyword, "keyword policy is the default")?;
        ensure(!config.agent.has_api_token(), "no api token by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_TASKDESK_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("taskdesk.toml");
            fs::write(
                &path,
                r#"
[agent]
base_url = "https://agents.internal"
api_token = "${TEST_TASKDESK_TOKEN}"

[review]
policy = "sampled"
sample_threshold = 0.25
seed = 9
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.agent.api_token.as_ref().map(|t| t.expose_secret().to_string())
                    == Some("token-from-env".to_string()),
                "api token should be loaded from environment",
            )?;
            ensure(config.agent.base_url == "https://agents.internal", "file base url")?;
            ensure(config.review.policy == ReviewPolicy::Sampled, "file review policy")?;
            ensure(config.review.seed == Some(9), "file review seed")?;
            Ok(())
        })();

        clear_vars(&["TEST_TASKDESK_TOKEN"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("taskdesk.toml");
        fs::write(&path, "[agent]\napi_token = \"${TASKDESK_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..Default::default() }) {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TASKDESK_TEST_UNSET_VAR"),
            "missing variable should be named",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TASKDESK_LOG_LEVEL", "warn");
        env::set_var("TASKDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["TASKDESK_LOG_LEVEL", "TASKDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TASKDESK_CHANNEL_WS_BASE_URL", "wss://from-env.example");
        env::set_var("TASKDESK_REVIEW_KEYWORDS", "deploy, , rollback");
        env::set_var("TASKDESK_AGENT_BASE_URL", "http://from-env.example");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("taskdesk.toml");
            fs::write(
                &path,
                r#"
[agent]
base_url = "http://from-file.example"

[channel]
ws_base_url = "ws://from-file.example"
display_name = "Reviewer"

[review]
keywords = ["from-file"]

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    agent_base_url: Some("http://from-override.example".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.agent.base_url == "http://from-override.example",
                "override agent url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.channel.ws_base_url == "wss://from-env.example",
                "env websocket url should win over file and defaults",
            )?;
            ensure(config.channel.display_name == "Reviewer", "file display name should apply")?;
            ensure(
                config.review.keywords == vec!["deploy".to_string(), "rollback".to_string()],
                "env keywords should be split on commas",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "TASKDESK_CHANNEL_WS_BASE_URL",
            "TASKDESK_REVIEW_KEYWORDS",
            "TASKDESK_AGENT_BASE_URL",
        ]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TASKDESK_CHANNEL_WS_BASE_URL", "http://localhost:8000");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("channel.ws_base_url") && message.contains("hint")
            );
            ensure(has_message, "validation failure should mention channel.ws_base_url")
        })();

        clear_vars(&["TASKDESK_CHANNEL_WS_BASE_URL"]);
        result
    }

    #[test]
    fn review_settings_are_validated() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let mut config = AppConfig::default();
        config.review.sample_threshold = 1.5;
        ensure(
            matches!(config.validate(), Err(ConfigError::Validation(ref m)) if m.contains("sample_threshold")),
            "threshold outside 0..=1 should fail",
        )?;

        let mut config = AppConfig::default();
        config.review.keywords = vec!["  ".to_string()];
        ensure(
            matches!(config.validate(), Err(ConfigError::Validation(ref m)) if m.contains("review.keywords")),
            "keyword policy without keywords should fail",
        )?;

        env::set_var("TASKDESK_AGENT_TIMEOUT_SECS", "soon");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["TASKDESK_AGENT_TIMEOUT_SECS"]);
        ensure(
            matches!(result, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "TASKDESK_AGENT_TIMEOUT_SECS"),
            "unparseable timeout should name the variable",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TASKDESK_AGENT_API_TOKEN", "td-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("td-secret-value"), "debug output should not contain token")?;
            ensure(config.agent.has_api_token(), "token should be loaded from env")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["TASKDESK_AGENT_API_TOKEN"]);
        result
    }
}
