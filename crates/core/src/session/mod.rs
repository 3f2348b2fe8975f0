pub mod engine;
pub mod states;

pub use engine::{event_name, transition, SessionEngine, SessionTransitionError};
pub use states::{ConnectionState, SessionContext, SessionEffect, SessionEvent, TransitionOutcome};
