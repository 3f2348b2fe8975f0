use async_trait::async_trait;
use taskdesk_core::identity::SessionId;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("no open connection for session `{0}`")]
    NotOpen(SessionId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEventKind {
    Opened,
    Frame(String),
    Dropped,
    Failed(String),
}

/// Connection-level notification, tagged with the session identity that opened the
/// connection so late events from a superseded session can be recognised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportEvent {
    pub session_id: SessionId,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(session_id: SessionId, kind: TransportEventKind) -> Self {
        Self { session_id, kind }
    }
}

/// Duplex connection to a conversational endpoint. `open` returns once the connection
/// attempt is under way; its outcome arrives on `events` as `Opened` or `Failed`.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn open(
        &self,
        session_id: &SessionId,
        url: &str,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<(), TransportError>;

    async fn send(&self, session_id: &SessionId, frame: String) -> Result<(), TransportError>;

    async fn release(&self, session_id: &SessionId) -> Result<(), TransportError>;
}

/// Accepts every connection and swallows every frame.
#[derive(Default)]
pub struct NoopChannelTransport;

#[async_trait]
impl ChannelTransport for NoopChannelTransport {
    async fn open(
        &self,
        session_id: &SessionId,
        _url: &str,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<(), TransportError> {
        events
            .send(TransportEvent::new(session_id.clone(), TransportEventKind::Opened))
            .map_err(|_| TransportError::Connect("event receiver dropped".to_owned()))
    }

    async fn send(&self, _session_id: &SessionId, _frame: String) -> Result<(), TransportError> {
        Ok(())
    }

    async fn release(&self, _session_id: &SessionId) -> Result<(), TransportError> {
        Ok(())
    }
}
