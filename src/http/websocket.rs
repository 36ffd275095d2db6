//! WebSocket echo endpoint.
//!
//! # Data Flow
//! ```text
//! Client ──── text frame ────→ /ws
//! Client ←─── same frame ───── /ws
//! ```
//!
//! Binary frames are ignored. Ping/pong is answered by axum. The session ends
//! when the peer closes or the socket errors.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};

pub async fn ws_echo(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(echo_session)
}

async fn echo_session(mut socket: WebSocket) {
    tracing::debug!("WebSocket session opened");
    let mut echoed = 0u64;

    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Err(e) = socket.send(Message::Text(text)).await {
                    tracing::debug!(error = %e, "WebSocket send failed");
                    break;
                }
                echoed += 1;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket receive failed");
                break;
            }
        }
    }

    tracing::debug!(echoed, "WebSocket session closed");
}
