use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use taskdesk_agent::{
    AssistantRuntime, HttpTaskListClient, RuntimeError, RuntimeEvent, RuntimeUpdate,
};
use taskdesk_channel::{ChannelManager, ChannelUpdate, Resolution, WebSocketTransport};
use taskdesk_core::config::{AppConfig, LoadOptions};
use taskdesk_core::domain::catalog::{AgentBinding, CatalogError, Department, Project, Role, Tool};
use taskdesk_core::errors::ApplicationError;
use taskdesk_core::review::classifier_from_config;
use taskdesk_core::routing::{TaskApply, TaskListState};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{async_runtime, error_class, CommandResult, EXIT_CONFIG, EXIT_RUNTIME};
use crate::logging::init_logging;

const HELP: &str = "commands: /approve [edited text], /cancel, /reset, /reconnect, /help, /quit";

#[derive(Clone, Debug)]
pub struct ChatArgs {
    pub department: String,
    pub tool: String,
    pub role: Option<String>,
    pub project: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ChatCommand {
    Send(String),
    Approve(Option<String>),
    Cancel,
    Reset,
    Reconnect,
    Help,
    Quit,
    Unknown(String),
    Nothing,
}

enum Input {
    Line(std::io::Result<Option<String>>),
    Event(RuntimeEvent),
}

struct ChatSummary {
    session_id: Option<String>,
    messages: usize,
}

pub fn run(args: &ChatArgs) -> CommandResult {
    let binding = match parse_selection(args) {
        Ok(binding) => binding,
        Err(error) => {
            return CommandResult::failure(
                "chat",
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
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };
    init_logging(&config.logging);

    let runtime = match async_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    match runtime.block_on(converse(config, binding)) {
        Ok(summary) => CommandResult::success_with_data(
            "chat",
            format!("conversation ended after {} message(s)", summary.messages),
            Some(json!({ "session_id": summary.session_id, "messages": summary.messages })),
        ),
        Err(error) => {
            let class = error.downcast_ref::<ApplicationError>().map(error_class).unwrap_or("io");
            CommandResult::failure("chat", class, format!("{error:#}"), EXIT_RUNTIME)
        }
    }
}

fn parse_selection(args: &ChatArgs) -> Result<AgentBinding, CatalogError> {
    let department = args.department.parse::<Department>()?;
    let tool = args.tool.parse::<Tool>()?;
    let role = args.role.as_deref().map(str::parse::<Role>).transpose()?;
    let project = args.project.as_deref().map(str::parse::<Project>).transpose()?;
    AgentBinding::new(department, role, project, tool)
}

async fn converse(config: AppConfig, binding: AgentBinding) -> anyhow::Result<ChatSummary> {
    let transport = Arc::new(WebSocketTransport::new(config.agent.api_token.clone()));
    let channel =
        ChannelManager::new(&config.channel, transport, classifier_from_config(&config.review));
    let tasks = HttpTaskListClient::new(&config.agent)
        .map_err(|error| ApplicationError::Integration(error.to_string()))?;
    let mut assistant = AssistantRuntime::new(channel, Arc::new(tasks));

    assistant.select_department(binding.department());
    if let Some(role) = binding.role() {
        assistant.select_role(role);
    }
    if let Some(project) = binding.project() {
        assistant.select_project(project).map_err(ApplicationError::from)?;
    }
    let updates = assistant.select_tool(binding.tool()).await.map_err(ApplicationError::from)?;
    print_channel_updates(&updates);
    println!("* {} via {}; {HELP}", binding.tool(), binding.department());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line),
            Some(event) = assistant.next_event() => Input::Event(event),
        };

        let line = match input {
            Input::Event(event) => {
                let updates =
                    assistant.handle_event(event).await.map_err(ApplicationError::from)?;
                report(&assistant, &updates);
                continue;
            }
            Input::Line(line) => line.context("reading stdin")?,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            ChatCommand::Nothing => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("* {HELP}"),
            ChatCommand::Unknown(name) => println!("* unknown command `/{name}`; {HELP}"),
            ChatCommand::Send(text) => {
                let result = assistant.send(text).await;
                report_result(&assistant, result);
            }
            ChatCommand::Reset => {
                let result = assistant.reset().await;
                report_result(&assistant, result);
            }
            ChatCommand::Reconnect => {
                let result = assistant.select_tool(binding.tool()).await;
                report_result(&assistant, result);
            }
            ChatCommand::Approve(edited) => resolve(&mut assistant, Some(edited)),
            ChatCommand::Cancel => resolve(&mut assistant, None),
        }
    }

    let summary = ChatSummary {
        session_id: assistant.channel().session_id().map(ToString::to_string),
        messages: assistant.channel().transcript().len(),
    };
    let updates = assistant.close().await.map_err(ApplicationError::from)?;
    print_channel_updates(&updates);
    Ok(summary)
}

fn parse_command(line: &str) -> ChatCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatCommand::Nothing;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ChatCommand::Send(trimmed.to_string());
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };
    match name {
        "approve" => ChatCommand::Approve((!argument.is_empty()).then(|| argument.to_string())),
        "cancel" => ChatCommand::Cancel,
        "reset" => ChatCommand::Reset,
        "reconnect" => ChatCommand::Reconnect,
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        other => ChatCommand::Unknown(other.to_string()),
    }
}

/// `Some(edited)` approves, optionally with replacement text; `None` cancels.
fn resolve(assistant: &mut AssistantRuntime, approval: Option<Option<String>>) {
    let channel = assistant.channel();
    let (Some(session_id), Some(pending)) =
        (channel.session_id().cloned(), channel.pending_review().cloned())
    else {
        println!("* nothing is waiting for review");
        return;
    };

    let resolution = match approval {
        Some(edited) => assistant.approve(
            &session_id,
            &pending.review_id,
            edited.unwrap_or(pending.content),
        ),
        None => assistant.cancel(&session_id, &pending.review_id),
    };
    match resolution {
        Resolution::Resolved(updates) => print_channel_updates(&updates),
        Resolution::Stale => println!("* that review is no longer current"),
    }
}

fn report_result(
    assistant: &AssistantRuntime,
    result: Result<Vec<ChannelUpdate>, RuntimeError>,
) {
    match result {
        Ok(updates) => print_channel_updates(&updates),
        Err(error) => {
            let correlation_id = assistant
                .channel()
                .session_id()
                .map(ToString::to_string)
                .unwrap_or_else(|| "chat".to_string());
            let interface = ApplicationError::from(error).into_interface(correlation_id);
            println!("* {} ({interface})", interface.user_message());
        }
    }
}

fn report(assistant: &AssistantRuntime, updates: &[RuntimeUpdate]) {
    for update in updates {
        match update {
            RuntimeUpdate::TaskList { project, outcome: TaskApply::Applied } => {
                println!("{}", describe_tasks(*project, assistant.router().task_list()));
            }
            RuntimeUpdate::TaskList { outcome: TaskApply::Stale, .. } => {}
            RuntimeUpdate::Channel(update) => {
                if let Some(line) = describe(update) {
                    println!("{line}");
                }
            }
        }
    }
}

fn print_channel_updates(updates: &[ChannelUpdate]) {
    for line in updates.iter().filter_map(describe) {
        println!("{line}");
    }
}

fn describe(update: &ChannelUpdate) -> Option<String> {
    match update {
        ChannelUpdate::StateChanged { to, .. } => {
            Some(format!("* connection {}", format!("{to:?}").to_lowercase()))
        }
        ChannelUpdate::HandshakeComplete => Some("* connected; type a message".to_string()),
        // The user already sees what they typed.
        ChannelUpdate::MessageAppended(message) if message.is_user() => None,
        ChannelUpdate::MessageAppended(message) => Some(format!("agent> {}", message.content)),
        ChannelUpdate::ReviewRequested(pending) => Some(format!(
            "review> {}\n  /approve [edited text] to post it, /cancel to discard",
            pending.content
        )),
        ChannelUpdate::ReplyQueued { position } => {
            Some(format!("* another reply is waiting behind the current review (#{position})"))
        }
        ChannelUpdate::TranscriptCleared => Some("* conversation reset".to_string()),
        ChannelUpdate::Disconnected { reason } => {
            Some(format!("* disconnected: {reason}; /reconnect starts a new session"))
        }
    }
}

fn describe_tasks(project: Project, list: &TaskListState) -> String {
    if let Some(error) = list.error() {
        return format!("* tasks for {project} unavailable: {error}");
    }
    let tasks = list.tasks();
    if tasks.is_empty() {
        format!("* no tasks for {project}")
    } else {
        format!("* tasks for {project}: {}", tasks.join(", "))
    }
}
