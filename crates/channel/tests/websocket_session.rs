use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use taskdesk_channel::{ChannelManager, ChannelUpdate, WebSocketTransport};
use taskdesk_core::config::ChannelConfig;
use taskdesk_core::domain::catalog::{AgentBinding, Department, Tool};
use taskdesk_core::identity::SequentialIdentityProvider;
use taskdesk_core::review::AlwaysApprove;
use taskdesk_core::session::ConnectionState;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMsg;
use tokio_tungstenite::{accept_async, accept_hdr_async, WebSocketStream};

fn binding() -> AgentBinding {
    AgentBinding::new(Department::TradeMan, None, None, Tool::RepoInfoAgent).expect("binding")
}

fn manager(ws_base_url: String, transport: WebSocketTransport) -> ChannelManager {
    let config = ChannelConfig { ws_base_url, display_name: "Ada".to_owned() };
    ChannelManager::new(&config, Arc::new(transport), Arc::new(AlwaysApprove))
        .with_identity_provider(Arc::new(SequentialIdentityProvider::new("ws")))
}

async fn next_text(socket: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        match socket.next().await {
            Some(Ok(WsMsg::Text(text))) => return text.as_str().to_owned(),
            Some(Ok(_)) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

async fn pump_until(
    manager: &mut ChannelManager,
    done: impl Fn(&ChannelManager) -> bool,
) -> Vec<ChannelUpdate> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done(manager) {
            seen.extend(manager.process_next_event().await.expect("event applies"));
        }
    })
    .await
    .expect("condition reached before timeout");
    seen
}

#[tokio::test]
async fn session_round_trip_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut socket = accept_async(stream).await.expect("websocket handshake");
        let init = next_text(&mut socket).await;
        socket
            .send(WsMsg::text(r#"{"type":"message","content":"hi"}"#))
            .await
            .expect("send reply");
        let message = next_text(&mut socket).await;
        socket.close(None).await.ok();
        (init, message)
    });

    let mut manager = manager(format!("ws://{addr}"), WebSocketTransport::default());
    manager.connect(binding()).await.expect("connect");
    pump_until(&mut manager, |m| m.transcript().iter().any(|msg| msg.content == "hi")).await;
    assert!(manager.handshake_complete());
    assert_eq!(manager.state(), ConnectionState::Open);

    manager.send("hello").await.expect("send");
    let updates = pump_until(&mut manager, |m| m.state() == ConnectionState::Errored).await;
    assert!(updates.iter().any(|u| matches!(u, ChannelUpdate::Disconnected { .. })));

    let (init, message) = server.await.expect("server task");
    assert_eq!(init, r#"{"type":"init","sessionId":"ws-1","name":"Ada"}"#);
    assert_eq!(message, r#"{"type":"message","content":"hello"}"#);
    assert_eq!(manager.transcript().len(), 2);
}

#[tokio::test]
async fn refused_connection_errors_the_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let mut manager = manager(format!("ws://{addr}"), WebSocketTransport::default());
    manager.connect(binding()).await.expect("connect is accepted");
    let updates = pump_until(&mut manager, |m| m.state() == ConnectionState::Errored).await;
    assert!(updates.iter().any(|u| matches!(u, ChannelUpdate::Disconnected { .. })));
}

#[tokio::test]
async fn bearer_token_reaches_the_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let seen = Arc::new(Mutex::new(None::<(String, Option<String>)>));
    let captured = Arc::clone(&seen);

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let callback = move |request: &Request, response: Response| {
            let auth = request
                .headers()
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            if let Ok(mut slot) = captured.lock() {
                *slot = Some((request.uri().path().to_owned(), auth));
            }
            Ok::<Response, ErrorResponse>(response)
        };
        let mut socket = accept_hdr_async(stream, callback).await.expect("handshake");
        let _init = next_text(&mut socket).await;
    });

    let transport = WebSocketTransport::new(Some(SecretString::from("td-secret".to_owned())));
    let mut manager = manager(format!("ws://{addr}"), transport);
    manager.connect(binding()).await.expect("connect");
    pump_until(&mut manager, ChannelManager::handshake_complete).await;
    server.await.expect("server task");

    let seen = seen.lock().expect("lock").clone();
    assert_eq!(
        seen,
        Some(("/ws/repo-info".to_owned(), Some("Bearer td-secret".to_owned())))
    );
}
