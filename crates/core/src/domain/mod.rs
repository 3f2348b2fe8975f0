pub mod catalog;
pub mod message;

pub use catalog::{AgentBinding, CatalogError, Department, Project, Role, Tool};
pub use message::{Message, MessageId, Sender};
