use std::sync::Arc;

use taskdesk_channel::{ChannelError, ChannelManager, ChannelUpdate, Resolution, TransportEvent};
use taskdesk_core::domain::catalog::{Department, Project, Role, Tool};
use taskdesk_core::errors::ApplicationError;
use taskdesk_core::identity::SessionId;
use taskdesk_core::review::ReviewId;
use taskdesk_core::routing::{RoutingError, TaskApply, TaskFetchTicket, ToolRouter};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::tasks::{TaskFetchError, TaskListClient};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl From<RuntimeError> for ApplicationError {
    fn from(value: RuntimeError) -> Self {
        match value {
            RuntimeError::Routing(error) => error.into(),
            RuntimeError::Channel(error) => error.into(),
        }
    }
}

/// Everything the runtime's event loop reacts to.
#[derive(Debug)]
pub enum RuntimeEvent {
    TasksFetched { ticket: TaskFetchTicket, result: Result<Vec<String>, TaskFetchError> },
    Transport(TransportEvent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeUpdate {
    TaskList { project: Project, outcome: TaskApply },
    Channel(ChannelUpdate),
}

/// Selection state, task lookups and the conversation channel behind one event loop.
pub struct AssistantRuntime {
    router: ToolRouter,
    tasks: Arc<dyn TaskListClient>,
    channel: ChannelManager,
    events_tx: UnboundedSender<RuntimeEvent>,
    events_rx: UnboundedReceiver<RuntimeEvent>,
}

impl AssistantRuntime {
    pub fn new(channel: ChannelManager, tasks: Arc<dyn TaskListClient>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self { router: ToolRouter::new(), tasks, channel, events_tx, events_rx }
    }

    pub fn router(&self) -> &ToolRouter {
        &self.router
    }

    pub fn channel(&self) -> &ChannelManager {
        &self.channel
    }

    /// A department change resets the downstream selection but leaves a live conversation
    /// running until a new tool is chosen.
    pub fn select_department(&mut self, department: Department) {
        self.router.select_department(department);
        info!(
            event_name = "runtime.department.selected",
            department = %department,
            "department selected"
        );
    }

    pub fn select_role(&mut self, role: Role) {
        self.router.select_role(role);
    }

    /// Starts a task-list fetch in the background; the result comes back through
    /// [`AssistantRuntime::next_event`].
    pub fn select_project(&mut self, project: Project) -> Result<TaskFetchTicket, RuntimeError> {
        let ticket = self.router.select_project(project)?;
        info!(
            event_name = "runtime.tasks.requested",
            project = %project,
            sequence = ticket.sequence,
            "fetching task list"
        );

        let tasks = Arc::clone(&self.tasks);
        let events = self.events_tx.clone();
        let spawned = ticket.clone();
        tokio::spawn(async move {
            let result = tasks.fetch_tasks(spawned.project).await;
            let _ = events.send(RuntimeEvent::TasksFetched { ticket: spawned, result });
        });
        Ok(ticket)
    }

    /// The router records the tool only after the channel has been rebound to it.
    pub async fn select_tool(&mut self, tool: Tool) -> Result<Vec<ChannelUpdate>, RuntimeError> {
        let binding = self.router.binding_for(tool)?;
        let updates = self.channel.rebind(binding).await?;
        self.router.select_tool(tool)?;
        Ok(updates)
    }

    pub async fn send(
        &mut self,
        text: impl Into<String>,
    ) -> Result<Vec<ChannelUpdate>, RuntimeError> {
        Ok(self.channel.send(text).await?)
    }

    pub async fn reset(&mut self) -> Result<Vec<ChannelUpdate>, RuntimeError> {
        Ok(self.channel.reset().await?)
    }

    pub async fn close(&mut self) -> Result<Vec<ChannelUpdate>, RuntimeError> {
        Ok(self.channel.close().await?)
    }

    pub fn approve(
        &mut self,
        session_id: &SessionId,
        review_id: &ReviewId,
        content: impl Into<String>,
    ) -> Resolution {
        self.channel.approve(session_id, review_id, content)
    }

    pub fn cancel(&mut self, session_id: &SessionId, review_id: &ReviewId) -> Resolution {
        self.channel.cancel(session_id, review_id)
    }

    /// Waits for whichever arrives first: a task-list completion or a transport event.
    /// Cancel safe; nothing is applied until [`AssistantRuntime::handle_event`].
    pub async fn next_event(&mut self) -> Option<RuntimeEvent> {
        tokio::select! {
            Some(event) = self.events_rx.recv() => Some(event),
            Some(event) = self.channel.next_event() => Some(RuntimeEvent::Transport(event)),
            else => None,
        }
    }

    pub async fn handle_event(
        &mut self,
        event: RuntimeEvent,
    ) -> Result<Vec<RuntimeUpdate>, RuntimeError> {
        match event {
            RuntimeEvent::TasksFetched { ticket, result } => {
                Ok(vec![self.apply_tasks(ticket, result)])
            }
            RuntimeEvent::Transport(event) => Ok(self
                .channel
                .handle_event(event)
                .await?
                .into_iter()
                .map(RuntimeUpdate::Channel)
                .collect()),
        }
    }

    pub async fn process_next_event(&mut self) -> Result<Vec<RuntimeUpdate>, RuntimeError> {
        match self.next_event().await {
            Some(event) => self.handle_event(event).await,
            None => Ok(Vec::new()),
        }
    }

    fn apply_tasks(
        &mut self,
        ticket: TaskFetchTicket,
        result: Result<Vec<String>, TaskFetchError>,
    ) -> RuntimeUpdate {
        if let Err(error) = &result {
            warn!(
                event_name = "runtime.tasks.failed",
                project = %ticket.project,
                error = %error,
                "task list fetch failed"
            );
        }
        let outcome = self.router.apply_task_result(&ticket, result.map_err(Into::into));
        if outcome == TaskApply::Stale {
            debug!(
                event_name = "runtime.tasks.stale",
                project = %ticket.project,
                sequence = ticket.sequence,
                current = self.router.current_sequence(),
                "dropping superseded task list"
            );
        }
        RuntimeUpdate::TaskList { project: ticket.project, outcome }
    }
}
