use serde_json::json;
use taskdesk_agent::{HttpTaskListClient, TaskFetchError, TaskListClient};
use taskdesk_core::config::{AppConfig, LoadOptions};
use taskdesk_core::domain::catalog::Project;

use crate::commands::{async_runtime, CommandResult, EXIT_CONFIG, EXIT_RUNTIME};

pub fn run(project: &str) -> CommandResult {
    let project = match project.parse::<Project>() {
        Ok(project) => project,
        Err(error) => {
            return CommandResult::failure(
                "tasks",
                "invalid_selection",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "tasks",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let runtime = match async_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "tasks",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let result = runtime.block_on(async {
        let client = HttpTaskListClient::new(&config.agent)?;
        client.fetch_tasks(project).await
    });

    match result {
        Ok(tasks) => CommandResult::success_with_data(
            "tasks",
            format!("{} task(s) for {project}", tasks.len()),
            Some(json!({ "project": project, "tasks": tasks })),
        ),
        Err(error) => {
            let error_class = match error {
                TaskFetchError::Status { .. } => "task_service_status",
                TaskFetchError::Request(_) => "task_service_unreachable",
                TaskFetchError::Decode(_) => "task_service_response",
            };
            CommandResult::failure("tasks", error_class, error.to_string(), EXIT_RUNTIME)
        }
    }
}
