use std::collections::VecDeque;
use std::sync::Arc;

use taskdesk_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use taskdesk_core::config::ChannelConfig;
use taskdesk_core::domain::catalog::AgentBinding;
use taskdesk_core::domain::message::Message;
use taskdesk_core::errors::{ApplicationError, DomainError};
use taskdesk_core::identity::{IdentityProvider, SessionId, UuidIdentityProvider};
use taskdesk_core::protocol::InboundEnvelope;
use taskdesk_core::review::{
    GateOutcome, PendingReview, ResolutionOutcome, ReviewClassifier, ReviewError, ReviewGate,
    ReviewId,
};
use taskdesk_core::session::{
    event_name, ConnectionState, SessionContext, SessionEffect, SessionEngine, SessionEvent,
    SessionTransitionError,
};
use taskdesk_core::transcript::TranscriptStore;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::protocol::{self, ProtocolError};
use crate::transport::{ChannelTransport, TransportError, TransportEvent, TransportEventKind};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error(transparent)]
    Transition(#[from] SessionTransitionError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("no conversation session is active")]
    NoSession,
}

impl From<ChannelError> for ApplicationError {
    fn from(value: ChannelError) -> Self {
        let message = value.to_string();
        match value {
            ChannelError::Transition(error) => Self::Domain(error.into()),
            ChannelError::Transport(error) => Self::Transport(error.to_string()),
            ChannelError::Protocol(error) => Self::Integration(error.to_string()),
            ChannelError::NoSession => Self::Domain(DomainError::InvariantViolation(message)),
        }
    }
}

/// What changed as a result of one operation or transport event, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelUpdate {
    StateChanged { from: ConnectionState, to: ConnectionState },
    HandshakeComplete,
    MessageAppended(Message),
    ReviewRequested(PendingReview),
    ReplyQueued { position: usize },
    TranscriptCleared,
    Disconnected { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Vec<ChannelUpdate>),
    /// The decision referred to a session or review that is no longer current.
    Stale,
}

struct Session {
    id: SessionId,
    state: ConnectionState,
    binding: AgentBinding,
    handshake_complete: bool,
    transcript: TranscriptStore,
    gate: ReviewGate,
}

pub struct ChannelManager {
    transport: Arc<dyn ChannelTransport>,
    identities: Arc<dyn IdentityProvider>,
    classifier: Arc<dyn ReviewClassifier>,
    audit: Arc<dyn AuditSink>,
    engine: SessionEngine,
    ws_base_url: String,
    display_name: String,
    session: Option<Session>,
    events_tx: UnboundedSender<TransportEvent>,
    events_rx: UnboundedReceiver<TransportEvent>,
}

impl ChannelManager {
    pub fn new(
        config: &ChannelConfig,
        transport: Arc<dyn ChannelTransport>,
        classifier: Arc<dyn ReviewClassifier>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            identities: Arc::new(UuidIdentityProvider),
            classifier,
            audit: Arc::new(TracingAuditSink),
            engine: SessionEngine::new(),
            ws_base_url: config.ws_base_url.clone(),
            display_name: config.display_name.clone(),
            session: None,
            events_tx,
            events_rx,
        }
    }

    pub fn with_identity_provider(mut self, identities: Arc<dyn IdentityProvider>) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map(|session| session.state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|session| &session.id)
    }

    pub fn binding(&self) -> Option<&AgentBinding> {
        self.session.as_ref().map(|session| &session.binding)
    }

    pub fn handshake_complete(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.handshake_complete)
    }

    pub fn transcript(&self) -> &[Message] {
        self.session.as_ref().map(|session| session.transcript.messages()).unwrap_or(&[])
    }

    pub fn pending_review(&self) -> Option<&PendingReview> {
        self.session.as_ref().and_then(|session| session.gate.pending())
    }

    pub fn queued_reviews(&self) -> usize {
        self.session.as_ref().map(|session| session.gate.queued()).unwrap_or(0)
    }

    /// Starts a new session bound to `binding`. A previous Closed or Errored session is
    /// replaced, never resumed.
    pub async fn connect(
        &mut self,
        binding: AgentBinding,
    ) -> Result<Vec<ChannelUpdate>, ChannelError> {
        let current = self.state();
        if matches!(current, ConnectionState::Connecting | ConnectionState::Open) {
            let endpoint = binding.endpoint_url(&self.ws_base_url);
            return Err(SessionTransitionError::InvalidTransition {
                state: current,
                event: SessionEvent::ConnectRequested { endpoint },
            }
            .into());
        }

        let id = self.identities.new_identity();
        let endpoint = binding.endpoint_url(&self.ws_base_url);
        info!(
            event_name = "channel.session.created",
            session_id = %id,
            department = %binding.department(),
            tool = %binding.tool(),
            endpoint = %endpoint,
            "starting conversation session"
        );
        self.session = Some(Session {
            id,
            state: ConnectionState::Disconnected,
            binding,
            handshake_complete: false,
            transcript: TranscriptStore::new(),
            gate: ReviewGate::new(Arc::clone(&self.classifier)),
        });

        self.dispatch(SessionEvent::ConnectRequested { endpoint }).await
    }

    pub async fn send(
        &mut self,
        text: impl Into<String>,
    ) -> Result<Vec<ChannelUpdate>, ChannelError> {
        self.dispatch(SessionEvent::SendRequested { content: text.into() }).await
    }

    pub async fn reset(&mut self) -> Result<Vec<ChannelUpdate>, ChannelError> {
        self.dispatch(SessionEvent::ResetRequested).await
    }

    /// Idempotent; without a session there is nothing to release.
    pub async fn close(&mut self) -> Result<Vec<ChannelUpdate>, ChannelError> {
        if self.session.is_none() {
            return Ok(Vec::new());
        }
        self.dispatch(SessionEvent::CloseRequested).await
    }

    /// Closes a live session before connecting with the new binding.
    pub async fn rebind(
        &mut self,
        binding: AgentBinding,
    ) -> Result<Vec<ChannelUpdate>, ChannelError> {
        let mut updates = Vec::new();
        if matches!(self.state(), ConnectionState::Connecting | ConnectionState::Open) {
            updates.extend(self.close().await?);
        }
        updates.extend(self.connect(binding).await?);
        Ok(updates)
    }

    pub fn approve(
        &mut self,
        session_id: &SessionId,
        review_id: &ReviewId,
        content: impl Into<String>,
    ) -> Resolution {
        let Some(session) = self.live_session(session_id) else {
            return Resolution::Stale;
        };
        let resolved = session.gate.approve(review_id, content, &mut session.transcript);
        self.finish_resolution(session_id, review_id, "review.approved", resolved)
    }

    pub fn cancel(&mut self, session_id: &SessionId, review_id: &ReviewId) -> Resolution {
        let Some(session) = self.live_session(session_id) else {
            return Resolution::Stale;
        };
        let resolved = session.gate.cancel(review_id, &mut session.transcript);
        self.finish_resolution(session_id, review_id, "review.cancelled", resolved)
    }

    /// Waits for the next transport notification. The manager keeps a sender alive, so
    /// this only returns `None` if the channel is torn down.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events_rx.recv().await
    }

    pub async fn handle_event(
        &mut self,
        event: TransportEvent,
    ) -> Result<Vec<ChannelUpdate>, ChannelError> {
        let Some(session) = self.session.as_ref() else {
            debug!(
                event_name = "channel.event.stale",
                event_session_id = %event.session_id,
                "dropping transport event without an active session"
            );
            return Ok(Vec::new());
        };
        if session.id != event.session_id {
            debug!(
                event_name = "channel.event.stale",
                session_id = %session.id,
                event_session_id = %event.session_id,
                "dropping transport event from a superseded session"
            );
            return Ok(Vec::new());
        }

        let session_event = match event.kind {
            TransportEventKind::Opened => SessionEvent::TransportOpened,
            TransportEventKind::Dropped => SessionEvent::TransportDropped,
            TransportEventKind::Failed(reason) => SessionEvent::TransportFailed { reason },
            TransportEventKind::Frame(frame) => match protocol::decode(&frame) {
                Ok(InboundEnvelope::Message { content }) => {
                    SessionEvent::EnvelopeReceived { content }
                }
                Ok(InboundEnvelope::Unsupported) => {
                    warn!(
                        event_name = "channel.frame.unsupported",
                        session_id = %session.id,
                        "ignoring inbound envelope with unsupported type"
                    );
                    return Ok(Vec::new());
                }
                Err(error) => {
                    warn!(
                        event_name = "channel.frame.undecodable",
                        session_id = %session.id,
                        error = %error,
                        "ignoring inbound frame that does not decode"
                    );
                    return Ok(Vec::new());
                }
            },
        };

        match self.dispatch(session_event).await {
            Ok(updates) => Ok(updates),
            Err(ChannelError::Transition(error)) => {
                debug!(
                    event_name = "channel.event.stale",
                    session_id = %self.session_id().map(SessionId::as_str).unwrap_or("none"),
                    error = %error,
                    "dropping transport event that no longer applies"
                );
                Ok(Vec::new())
            }
            Err(error) => Err(error),
        }
    }

    /// Waits for the next transport event and applies it.
    pub async fn process_next_event(&mut self) -> Result<Vec<ChannelUpdate>, ChannelError> {
        match self.next_event().await {
            Some(event) => self.handle_event(event).await,
            None => Ok(Vec::new()),
        }
    }

    fn live_session(&mut self, session_id: &SessionId) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|session| &session.id == session_id && !session.state.is_terminal())
    }

    fn finish_resolution(
        &self,
        session_id: &SessionId,
        review_id: &ReviewId,
        event_type: &'static str,
        resolved: Result<ResolutionOutcome, ReviewError>,
    ) -> Resolution {
        let audit = AuditContext::for_session(session_id, "reviewer");
        match resolved {
            Ok(outcome) => {
                info!(
                    event_name = event_type,
                    session_id = %session_id,
                    review_id = %review_id,
                    promoted = outcome.promoted.len(),
                    "review resolved"
                );
                let event = AuditEvent::new(
                    &audit,
                    event_type,
                    AuditCategory::Review,
                    AuditOutcome::Success,
                )
                .with_metadata("review_id", review_id.to_string());
                self.audit.emit(event);
                let mut updates: Vec<ChannelUpdate> =
                    outcome.appended.into_iter().map(ChannelUpdate::MessageAppended).collect();
                for promoted in outcome.promoted {
                    updates.push(self.gate_update(session_id, promoted));
                }
                Resolution::Resolved(updates)
            }
            Err(error) => {
                debug!(
                    event_name = "channel.review.stale",
                    session_id = %session_id,
                    review_id = %review_id,
                    error = %error,
                    "dropping review decision that no longer applies"
                );
                Resolution::Stale
            }
        }
    }

    fn gate_update(&self, session_id: &SessionId, outcome: GateOutcome) -> ChannelUpdate {
        match outcome {
            GateOutcome::Appended(message) => ChannelUpdate::MessageAppended(message),
            GateOutcome::PendingCreated(pending) => {
                info!(
                    event_name = "review.pending_created",
                    session_id = %session_id,
                    review_id = %pending.review_id,
                    "reply is waiting for review"
                );
                self.audit.emit(
                    AuditEvent::new(
                        &AuditContext::for_session(session_id, "channel"),
                        "review.pending_created",
                        AuditCategory::Review,
                        AuditOutcome::Success,
                    )
                    .with_metadata("review_id", pending.review_id.to_string()),
                );
                ChannelUpdate::ReviewRequested(pending)
            }
            GateOutcome::Queued { position } => ChannelUpdate::ReplyQueued { position },
        }
    }

    /// Runs `event` and every follow-up event its effects produce through the transition
    /// function. Only a rejection of the initial event is reported as an error.
    async fn dispatch(&mut self, event: SessionEvent) -> Result<Vec<ChannelUpdate>, ChannelError> {
        let mut updates = Vec::new();
        let mut queue = VecDeque::from([event]);
        let mut initial = true;

        while let Some(event) = queue.pop_front() {
            let Some(session) = self.session.as_ref() else {
                return Err(ChannelError::NoSession);
            };
            let context = SessionContext {
                session_id: session.id.clone(),
                display_name: self.display_name.clone(),
                handshake_complete: session.handshake_complete,
            };
            let audit = AuditContext::for_session(&session.id, "channel");
            let outcome = match self.engine.apply_with_audit(
                &session.state,
                &event,
                &context,
                &*self.audit,
                &audit,
            ) {
                Ok(outcome) => outcome,
                Err(error) if initial => return Err(error.into()),
                Err(error) => {
                    debug!(
                        event_name = "channel.session.follow_up_dropped",
                        session_id = %context.session_id,
                        error = %error,
                        "follow-up event no longer applies"
                    );
                    continue;
                }
            };
            initial = false;

            if outcome.from != outcome.to {
                info!(
                    event_name = "channel.session.transition",
                    session_id = %context.session_id,
                    from = ?outcome.from,
                    to = ?outcome.to,
                    trigger = event_name(&outcome.event),
                    "session state changed"
                );
                updates.push(ChannelUpdate::StateChanged { from: outcome.from, to: outcome.to });
            }
            if let Some(session) = self.session.as_mut() {
                session.state = outcome.to;
            }

            for effect in outcome.effects {
                self.execute(effect, &outcome.event, &mut updates, &mut queue).await?;
            }
        }

        Ok(updates)
    }

    async fn execute(
        &mut self,
        effect: SessionEffect,
        trigger: &SessionEvent,
        updates: &mut Vec<ChannelUpdate>,
        queue: &mut VecDeque<SessionEvent>,
    ) -> Result<(), ChannelError> {
        let transport = Arc::clone(&self.transport);
        let Some(session) = self.session.as_mut() else {
            return Err(ChannelError::NoSession);
        };

        match effect {
            SessionEffect::OpenTransport { endpoint } => {
                let events = self.events_tx.clone();
                if let Err(error) = transport.open(&session.id, &endpoint, events).await {
                    warn!(
                        event_name = "channel.transport.open_failed",
                        session_id = %session.id,
                        error = %error,
                        "could not open transport"
                    );
                    queue.push_back(SessionEvent::TransportFailed { reason: error.to_string() });
                }
            }
            SessionEffect::SendEnvelope(envelope) => {
                let frame = protocol::encode(&envelope)?;
                match transport.send(&session.id, frame).await {
                    Ok(()) => {
                        debug!(
                            event_name = "channel.envelope.sent",
                            session_id = %session.id,
                            kind = envelope.kind(),
                            "envelope written"
                        );
                        if envelope.kind() == "init" {
                            queue.push_back(SessionEvent::InitDelivered);
                        }
                    }
                    Err(error) => {
                        warn!(
                            event_name = "channel.envelope.send_failed",
                            session_id = %session.id,
                            kind = envelope.kind(),
                            error = %error,
                            "could not write envelope"
                        );
                        let reason = error.to_string();
                        queue.push_back(SessionEvent::TransportFailed { reason });
                    }
                }
            }
            SessionEffect::AppendUserMessage { content } => {
                let message = session.transcript.append_user(content);
                updates.push(ChannelUpdate::MessageAppended(message));
            }
            SessionEffect::SubmitForReview { content } => {
                let outcome = session.gate.submit(content, &mut session.transcript);
                let session_id = session.id.clone();
                updates.push(self.gate_update(&session_id, outcome));
            }
            SessionEffect::ClearTranscript => {
                session.transcript.clear();
                updates.push(ChannelUpdate::TranscriptCleared);
            }
            SessionEffect::ClearPendingReview => session.gate.clear(),
            SessionEffect::CompleteHandshake => {
                session.handshake_complete = true;
                info!(
                    event_name = "channel.session.handshake_complete",
                    session_id = %session.id,
                    "session bound by remote"
                );
                updates.push(ChannelUpdate::HandshakeComplete);
            }
            SessionEffect::ReleaseTransport => {
                if let Err(error) = transport.release(&session.id).await {
                    warn!(
                        event_name = "channel.transport.release_failed",
                        session_id = %session.id,
                        error = %error,
                        "transport release failed"
                    );
                }
            }
            SessionEffect::SurfaceDisconnected => {
                let reason = match trigger {
                    SessionEvent::TransportFailed { reason } => reason.clone(),
                    _ => "connection closed by remote".to_owned(),
                };
                warn!(
                    event_name = "channel.session.disconnected",
                    session_id = %session.id,
                    reason = %reason,
                    "conversation disconnected"
                );
                updates.push(ChannelUpdate::Disconnected { reason });
            }
        }

        Ok(())
    }
}
