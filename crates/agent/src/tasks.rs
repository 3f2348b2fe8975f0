use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use taskdesk_core::config::AgentConfig;
use taskdesk_core::domain::catalog::Project;
use taskdesk_core::routing::FetchFailure;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TaskFetchError {
    #[error("task service answered with status {status}")]
    Status { status: u16 },
    #[error("task request failed: {0}")]
    Request(String),
    #[error("task list could not be decoded: {0}")]
    Decode(String),
}

impl From<TaskFetchError> for FetchFailure {
    fn from(value: TaskFetchError) -> Self {
        FetchFailure::new(value.to_string())
    }
}

/// Source of the task names offered for a project.
#[async_trait]
pub trait TaskListClient: Send + Sync {
    async fn fetch_tasks(&self, project: Project) -> Result<Vec<String>, TaskFetchError>;
}

/// `GET {base_url}/api/tasks?project=<name>`, answered with a JSON array of task names.
pub struct HttpTaskListClient {
    client: Client,
    base_url: String,
    api_token: Option<SecretString>,
}

impl HttpTaskListClient {
    pub fn new(config: &AgentConfig) -> Result<Self, TaskFetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| TaskFetchError::Request(error.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn tasks_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }
}

#[async_trait]
impl TaskListClient for HttpTaskListClient {
    async fn fetch_tasks(&self, project: Project) -> Result<Vec<String>, TaskFetchError> {
        let mut request =
            self.client.get(self.tasks_url()).query(&[("project", project.display_name())]);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| TaskFetchError::Request(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TaskFetchError::Status { status: status.as_u16() });
        }

        let body =
            response.bytes().await.map_err(|error| TaskFetchError::Request(error.to_string()))?;
        let tasks: Vec<String> = serde_json::from_slice(&body)
            .map_err(|error| TaskFetchError::Decode(error.to_string()))?;
        debug!(
            event_name = "agent.tasks.fetched",
            project = %project,
            count = tasks.len(),
            "fetched task list"
        );
        Ok(tasks)
    }
}
