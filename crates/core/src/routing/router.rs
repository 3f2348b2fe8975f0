use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::catalog::{AgentBinding, CatalogError, Department, Project, Role, Tool};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("select a department first")]
    DepartmentRequired,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub department: Option<Department>,
    pub role: Option<Role>,
    pub project: Option<Project>,
    pub tool: Option<Tool>,
}

/// Issued for every project selection; a fetch result only applies while its sequence is
/// still the newest one the router handed out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFetchTicket {
    pub sequence: u64,
    pub project: Project,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskApply {
    Applied,
    Stale,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
}

impl FetchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskListState {
    tasks: Arc<[String]>,
    error: Option<String>,
    loading: bool,
}

impl TaskListState {
    fn empty() -> Self {
        Self { tasks: Arc::from(Vec::new()), error: None, loading: false }
    }

    pub fn tasks(&self) -> Arc<[String]> {
        Arc::clone(&self.tasks)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

#[derive(Clone, Debug)]
pub struct ToolRouter {
    selection: Selection,
    task_list: TaskListState,
    sequence: u64,
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRouter {
    pub fn new() -> Self {
        Self { selection: Selection::default(), task_list: TaskListState::empty(), sequence: 0 }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn task_list(&self) -> &TaskListState {
        &self.task_list
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Restarts everything downstream of the department, even when the previous project or
    /// tool would still be permitted.
    pub fn select_department(&mut self, department: Department) {
        self.sequence += 1;
        self.selection.department = Some(department);
        self.selection.project = None;
        self.selection.tool = None;
        self.task_list = TaskListState::empty();
    }

    pub fn select_role(&mut self, role: Role) {
        self.selection.role = Some(role);
    }

    pub fn select_project(&mut self, project: Project) -> Result<TaskFetchTicket, RoutingError> {
        let department = self.selection.department.ok_or(RoutingError::DepartmentRequired)?;
        if !department.permits_project(project) {
            return Err(CatalogError::ProjectNotPermitted { department, project }.into());
        }

        self.sequence += 1;
        self.selection.project = Some(project);
        self.task_list = TaskListState { loading: true, ..TaskListState::empty() };
        Ok(TaskFetchTicket { sequence: self.sequence, project })
    }

    /// Validates `tool` against the current selection without recording it.
    pub fn binding_for(&self, tool: Tool) -> Result<AgentBinding, RoutingError> {
        let department = self.selection.department.ok_or(RoutingError::DepartmentRequired)?;
        Ok(AgentBinding::new(department, self.selection.role, self.selection.project, tool)?)
    }

    pub fn select_tool(&mut self, tool: Tool) -> Result<AgentBinding, RoutingError> {
        let binding = self.binding_for(tool)?;
        self.selection.tool = Some(tool);
        Ok(binding)
    }

    /// The binding for the current selection, once a department and tool are chosen.
    pub fn binding(&self) -> Option<AgentBinding> {
        let department = self.selection.department?;
        let tool = self.selection.tool?;
        AgentBinding::new(department, self.selection.role, self.selection.project, tool).ok()
    }

    pub fn apply_task_result(
        &mut self,
        ticket: &TaskFetchTicket,
        result: Result<Vec<String>, FetchFailure>,
    ) -> TaskApply {
        if ticket.sequence != self.sequence || self.selection.project != Some(ticket.project) {
            return TaskApply::Stale;
        }

        self.task_list = match result {
            Ok(tasks) => TaskListState { tasks: Arc::from(tasks), error: None, loading: false },
            Err(failure) => TaskListState { error: Some(failure.message), ..TaskListState::empty() },
        };
        TaskApply::Applied
    }
}
