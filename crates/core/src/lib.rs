pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod protocol;
pub mod review;
pub mod routing;
pub mod session;
pub mod transcript;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use config::{AppConfig, ConfigError, LoadOptions};
pub use domain::catalog::{AgentBinding, CatalogError, Department, Project, Role, Tool};
pub use domain::message::{Message, MessageId, Sender};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use identity::{IdentityProvider, SequentialIdentityProvider, SessionId, UuidIdentityProvider};
pub use protocol::{InboundEnvelope, OutboundEnvelope};
pub use review::{
    classifier_from_config, GateOutcome, PendingReview, ResolutionOutcome, ReviewClassifier,
    ReviewDecision, ReviewError, ReviewGate, ReviewId,
};
pub use routing::{
    FetchFailure, RoutingError, Selection, TaskApply, TaskFetchTicket, TaskListState, ToolRouter,
};
pub use session::{
    ConnectionState, SessionContext, SessionEffect, SessionEngine, SessionEvent,
    SessionTransitionError, TransitionOutcome,
};
pub use transcript::TranscriptStore;
