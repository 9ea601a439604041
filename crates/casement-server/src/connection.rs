//! Per-connection handler: hello, then requests and event fan-out.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use casement_common::{new_correlation_id, Event};
use casement_groups::GroupService;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::dispatch::dispatch;
use crate::protocol::{ClientHello, Request, ServerFrame};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    service: Arc<GroupService>,
    hello_timeout: Duration,
) {
    let (mut sink, mut stream) = ws.split();

    // 1. The first frame must be a hello.
    let client = match read_hello(&mut stream, addr, hello_timeout).await {
        Some(client) => client,
        None => return,
    };

    // Subscribe before announcing readiness so no event is missed.
    let mut events = service.events().subscribe();
    let session = new_correlation_id();
    if send_frame(&mut sink, &ServerFrame::Ready { session: session.clone() })
        .await
        .is_err()
    {
        return;
    }
    tracing::info!(peer = %addr, session = %session, client = ?client, "Client connected");

    // 2. Requests run concurrently; their responses come back through `rx`.
    let (tx, mut rx) = mpsc::channel::<String>(256);

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let shutdown = matches!(event, Event::Shutdown);
                        if send_frame(&mut sink, &ServerFrame::Event { event }).await.is_err() || shutdown {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(session = %session, skipped = n, "Client lagged behind events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_request(&text, &service, &tx, &session);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // 3. Cleanup.
    let _ = sink.close().await;
    tracing::info!(peer = %addr, session = %session, "Client disconnected");
}

/// Parse one request and spawn its execution. Malformed frames get an
/// error frame straight away.
fn handle_request(
    text: &str,
    service: &Arc<GroupService>,
    tx: &mpsc::Sender<String>,
    session: &str,
) {
    let request: Request = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(session = %session, error = %e, "Malformed request");
            let frame = ServerFrame::Error {
                message: format!("malformed request: {e}"),
            };
            let _ = tx.try_send(frame.to_json());
            return;
        }
    };

    let service = Arc::clone(service);
    let tx = tx.clone();
    let session = session.to_string();
    tokio::spawn(async move {
        let id = request.id;
        let result = dispatch(&service, request.action).await;
        if let Err(e) = &result {
            tracing::debug!(session = %session, id, error = %e, "Request failed");
        }
        let _ = tx.send(ServerFrame::response(id, result).to_json()).await;
    });
}

/// Read and parse the first message as a ClientHello.
async fn read_hello(
    stream: &mut WsStream,
    addr: SocketAddr,
    timeout: Duration,
) -> Option<Option<String>> {
    let frame = tokio::time::timeout(timeout, stream.next()).await;

    match frame {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ClientHello>(&text) {
            Ok(ClientHello::Hello { client }) => Some(client),
            Err(e) => {
                tracing::warn!(peer = %addr, error = %e, "Invalid hello message");
                None
            }
        },
        Ok(Some(Ok(_))) => {
            tracing::warn!(peer = %addr, "Expected text hello, got another frame type");
            None
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "WS error during hello");
            None
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Connection closed before hello");
            None
        }
        Err(_) => {
            tracing::warn!(peer = %addr, timeout_secs = timeout.as_secs(), "Hello timeout");
            None
        }
    }
}

/// Send a ServerFrame as a JSON text frame.
async fn send_frame(
    sink: &mut WsSink,
    frame: &ServerFrame,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    sink.send(Message::Text(frame.to_json().into())).await
}
