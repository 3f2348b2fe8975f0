use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::protocol::OutboundEnvelope;
use crate::session::states::{
    ConnectionState, SessionContext, SessionEffect, SessionEvent, TransitionOutcome,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: ConnectionState, event: SessionEvent },
    #[error("session handshake has not been acknowledged yet")]
    HandshakePending,
    #[error("message content is empty")]
    EmptyMessage,
}

#[derive(Clone, Debug, Default)]
pub struct SessionEngine;

impl SessionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn initial_state(&self) -> ConnectionState {
        ConnectionState::Disconnected
    }

    pub fn apply(
        &self,
        current: &ConnectionState,
        event: &SessionEvent,
        context: &SessionContext,
    ) -> Result<TransitionOutcome, SessionTransitionError> {
        transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &ConnectionState,
        event: &SessionEvent,
        context: &SessionContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, SessionTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "session.transition_applied",
                        AuditCategory::Channel,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", event_name(&outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "session.transition_rejected",
                        AuditCategory::Channel,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("event", event_name(event))
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

/// Short, content-free label for an event; message bodies never reach audit metadata.
pub fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::ConnectRequested { .. } => "connect_requested",
        SessionEvent::TransportOpened => "transport_opened",
        SessionEvent::InitDelivered => "init_delivered",
        SessionEvent::SendRequested { .. } => "send_requested",
        SessionEvent::EnvelopeReceived { .. } => "envelope_received",
        SessionEvent::ResetRequested => "reset_requested",
        SessionEvent::CloseRequested => "close_requested",
        SessionEvent::TransportFailed { .. } => "transport_failed",
        SessionEvent::TransportDropped => "transport_dropped",
    }
}

/// Pure transition table; callers apply the returned effects.
pub fn transition(
    current: &ConnectionState,
    event: &SessionEvent,
    context: &SessionContext,
) -> Result<TransitionOutcome, SessionTransitionError> {
    use ConnectionState::{Closed, Connecting, Disconnected, Errored, Open};
    use SessionEffect::{
        AppendUserMessage, ClearPendingReview, ClearTranscript, CompleteHandshake, OpenTransport,
        ReleaseTransport, SendEnvelope, SubmitForReview, SurfaceDisconnected,
    };
    use SessionEvent::{
        CloseRequested, ConnectRequested, EnvelopeReceived, InitDelivered, ResetRequested,
        SendRequested, TransportDropped, TransportFailed, TransportOpened,
    };

    let (to, effects) = match (current, event) {
        (Disconnected, ConnectRequested { endpoint }) | (Closed, ConnectRequested { endpoint }) => {
            (Connecting, vec![OpenTransport { endpoint: endpoint.clone() }])
        }
        (Connecting, TransportOpened) => (
            Open,
            vec![SendEnvelope(OutboundEnvelope::Init {
                session_id: context.session_id.clone(),
                name: context.display_name.clone(),
            })],
        ),
        (Open, InitDelivered) if context.handshake_complete => (Open, Vec::new()),
        (Open, InitDelivered) => (Open, vec![CompleteHandshake]),
        (Open, SendRequested { content }) => {
            if !context.handshake_complete {
                return Err(SessionTransitionError::HandshakePending);
            }
            if content.trim().is_empty() {
                return Err(SessionTransitionError::EmptyMessage);
            }
            (
                Open,
                vec![
                    AppendUserMessage { content: content.clone() },
                    SendEnvelope(OutboundEnvelope::Message { content: content.clone() }),
                ],
            )
        }
        (Open, EnvelopeReceived { content }) => {
            (Open, vec![SubmitForReview { content: content.clone() }])
        }
        (Open, ResetRequested) => {
            (Open, vec![SendEnvelope(OutboundEnvelope::Reset), ClearTranscript, ClearPendingReview])
        }
        (Disconnected, CloseRequested) | (Connecting, CloseRequested) | (Open, CloseRequested) => {
            (Closed, vec![ReleaseTransport])
        }
        (Closed, CloseRequested) => (Closed, Vec::new()),
        (Errored, CloseRequested) => (Errored, vec![ReleaseTransport]),
        (Connecting, TransportFailed { .. })
        | (Open, TransportFailed { .. })
        | (Connecting, TransportDropped)
        | (Open, TransportDropped) => (Errored, vec![ReleaseTransport, SurfaceDisconnected]),
        _ => {
            return Err(SessionTransitionError::InvalidTransition {
                state: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), effects })
}
