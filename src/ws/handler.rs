//! WebSocket connection handling
//!
//! Each accepted socket gets a fresh connection id and a per-connection
//! outbound channel. Two tasks drive the socket: one forwards outbound
//! events onto the wire, the other parses inbound frames and feeds them to
//! the hub. When either side ends, the other is aborted and the hub tears
//! the connection down.

use crate::hub::Hub;
use crate::types::ConnectionId;
use crate::ws::messages::ClientEvent;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(hub): State<Arc<Hub>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let client_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    ws.on_upgrade(move |socket| handle_socket(socket, hub, addr, client_agent))
}

async fn handle_socket(
    socket: WebSocket,
    hub: Arc<Hub>,
    addr: SocketAddr,
    client_agent: Option<String>,
) {
    let connection_id: ConnectionId = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    hub.connect(connection_id, tx, Some(addr.ip().to_string()), client_agent)
        .await;

    // Forward hub events onto the wire
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to serialize outbound event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Parse inbound frames and feed them to the hub
    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    debug!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match frame {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => recv_hub.handle_event(connection_id, event).await,
                    Err(e) => {
                        warn!(
                            "Ignoring malformed frame from '{}': {}",
                            connection_id, e
                        );
                    }
                },
                Message::Close(_) => {
                    info!("Connection '{}' requested close", connection_id);
                    break;
                }
                // Ping/pong is answered by the protocol layer
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.disconnect(connection_id).await;
}
