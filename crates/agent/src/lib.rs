//! Assistant runtime for taskdesk.
//!
//! - **Tasks** (`tasks`) - task-list lookups against the agent service
//! - **Runtime** (`runtime`) - ties tool selection to the conversation channel
//!
//! Task-list results resolve through the runtime's event loop, so a result for a project
//! that is no longer selected is dropped instead of overwriting the current list.

pub mod runtime;
pub mod tasks;

pub use runtime::{AssistantRuntime, RuntimeError, RuntimeEvent, RuntimeUpdate};
pub use tasks::{HttpTaskListClient, TaskFetchError, TaskListClient};
