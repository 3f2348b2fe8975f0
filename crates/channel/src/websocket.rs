use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use taskdesk_core::identity::SessionId;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMsg;
use tracing::{debug, info, warn};

use crate::transport::{ChannelTransport, TransportError, TransportEvent, TransportEventKind};

struct OutboundFrame {
    frame: String,
    written: oneshot::Sender<Result<(), String>>,
}

struct Connection {
    outbound: UnboundedSender<OutboundFrame>,
    task: JoinHandle<()>,
}

/// One WebSocket connection per session identity, each driven by its own task.
#[derive(Default)]
pub struct WebSocketTransport {
    bearer_token: Option<SecretString>,
    connections: Mutex<HashMap<SessionId, Connection>>,
}

impl WebSocketTransport {
    pub fn new(bearer_token: Option<SecretString>) -> Self {
        Self { bearer_token, connections: Mutex::new(HashMap::new()) }
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<SessionId, Connection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request(&self, url: &str) -> Result<Request, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|error| TransportError::Connect(format!("invalid url `{url}`: {error}")))?;
        if let Some(token) = &self.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| TransportError::Connect("api token is not a valid header".into()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }
}

#[async_trait]
impl ChannelTransport for WebSocketTransport {
    async fn open(
        &self,
        session_id: &SessionId,
        url: &str,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<(), TransportError> {
        let request = self.request(url)?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(session_id.clone(), request, outbound_rx, events));

        info!(
            event_name = "channel.transport.opening",
            session_id = %session_id,
            url,
            "opening websocket connection"
        );
        if let Some(previous) = self
            .connections()
            .insert(session_id.clone(), Connection { outbound: outbound_tx, task })
        {
            previous.task.abort();
        }
        Ok(())
    }

    async fn send(&self, session_id: &SessionId, frame: String) -> Result<(), TransportError> {
        let outbound = self
            .connections()
            .get(session_id)
            .map(|connection| connection.outbound.clone())
            .ok_or_else(|| TransportError::NotOpen(session_id.clone()))?;

        let (written_tx, written_rx) = oneshot::channel();
        outbound
            .send(OutboundFrame { frame, written: written_tx })
            .map_err(|_| TransportError::Send("connection task has stopped".to_owned()))?;
        let written = written_rx.await.map_err(|_| {
            TransportError::Send("connection closed before the frame was written".to_owned())
        })?;
        written.map_err(TransportError::Send)
    }

    async fn release(&self, session_id: &SessionId) -> Result<(), TransportError> {
        // Dropping the outbound queue lets the task send a close frame and exit.
        if let Some(connection) = self.connections().remove(session_id) {
            debug!(
                event_name = "channel.transport.released",
                session_id = %session_id,
                finished = connection.task.is_finished(),
                "released websocket connection"
            );
        }
        Ok(())
    }
}

async fn run_connection(
    session_id: SessionId,
    request: Request,
    mut outbound: UnboundedReceiver<OutboundFrame>,
    events: UnboundedSender<TransportEvent>,
) {
    let emit = |kind: TransportEventKind| {
        let _ = events.send(TransportEvent::new(session_id.clone(), kind));
    };

    let stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(error) => {
            warn!(
                event_name = "channel.transport.connect_failed",
                session_id = %session_id,
                error = %error,
                "websocket connect failed"
            );
            emit(TransportEventKind::Failed(error.to_string()));
            return;
        }
    };
    emit(TransportEventKind::Opened);

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            inbound = read.next() => match inbound {
                Some(Ok(WsMsg::Text(text))) => {
                    emit(TransportEventKind::Frame(text.as_str().to_owned()));
                }
                Some(Ok(WsMsg::Close(_))) | None => {
                    emit(TransportEventKind::Dropped);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    emit(TransportEventKind::Failed(error.to_string()));
                    break;
                }
            },
            request = outbound.recv() => match request {
                Some(OutboundFrame { frame, written }) => {
                    let result = write.send(WsMsg::text(frame)).await.map_err(|e| e.to_string());
                    let failed = result.is_err();
                    let _ = written.send(result);
                    if failed {
                        break;
                    }
                }
                None => {
                    let _ = write.send(WsMsg::Close(None)).await;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;

    use super::WebSocketTransport;
    use crate::transport::{ChannelTransport, TransportError};
    use taskdesk_core::identity::SessionId;

    #[test]
    fn bearer_token_is_sent_as_authorization_header() {
        let transport = WebSocketTransport::new(Some(SecretString::from("td-token".to_owned())));
        let request = transport.request("ws://localhost:8000/ws/repo-info").expect("request");
        assert_eq!(
            request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok()),
            Some("Bearer td-token")
        );

        let anonymous = WebSocketTransport::default();
        let request = anonymous.request("ws://localhost:8000/ws/repo-info").expect("request");
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn invalid_url_is_a_connect_error() {
        let error = WebSocketTransport::default().request("not a url").expect_err("invalid");
        assert!(matches!(error, TransportError::Connect(_)));
    }

    #[tokio::test]
    async fn send_without_open_connection_is_rejected() {
        let error = WebSocketTransport::default()
            .send(&SessionId("missing".to_owned()), "{}".to_owned())
            .await
            .expect_err("not open");
        assert_eq!(error, TransportError::NotOpen(SessionId("missing".to_owned())));
    }
}
