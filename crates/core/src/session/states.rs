use serde::{Deserialize, Serialize};

use crate::identity::SessionId;
use crate::protocol::OutboundEnvelope;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    ConnectRequested { endpoint: String },
    TransportOpened,
    InitDelivered,
    SendRequested { content: String },
    EnvelopeReceived { content: String },
    ResetRequested,
    CloseRequested,
    TransportFailed { reason: String },
    TransportDropped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub display_name: String,
    pub handshake_complete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEffect {
    OpenTransport { endpoint: String },
    SendEnvelope(OutboundEnvelope),
    AppendUserMessage { content: String },
    SubmitForReview { content: String },
    ClearTranscript,
    ClearPendingReview,
    CompleteHandshake,
    ReleaseTransport,
    SurfaceDisconnected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub event: SessionEvent,
    pub effects: Vec<SessionEffect>,
}
