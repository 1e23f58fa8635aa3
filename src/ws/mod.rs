pub mod admin;
pub mod handlers;
pub mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{Envelope, Outbound, Reply};
use crate::state::AppState;

pub const PROTOCOL_VERSION: &str = "1.0";

/// WebSocket upgrade handler for chat bridges
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("Bridge connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(frame: &Outbound) -> Option<Message> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to encode outbound frame: {}", e);
            None
        }
    }
}

/// Handle one bridge connection: commands in, replies and effects out
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let welcome = Outbound::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if let Some(msg) = encode(&welcome) {
        if sender.send(msg).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    let mut effects_rx = state.effects.subscribe();

    loop {
        tokio::select! {
            effect = effects_rx.recv() => {
                match effect {
                    Ok(effect) => {
                        if let Some(msg) = encode(&Outbound::Effect { effect }) {
                            if sender.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Bridge lagging, dropped {} effects", n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received command: {}", text);

                        let reply = match serde_json::from_str::<Envelope>(&text) {
                            Ok(envelope) => handlers::handle_command(envelope, &state).await,
                            Err(e) => {
                                tracing::error!("Failed to parse command: {}", e);
                                Reply::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid command format: {}", e),
                                }
                            }
                        };

                        if let Some(msg) = encode(&Outbound::Reply { reply }) {
                            if sender.send(msg).await.is_err() {
                                tracing::error!("Failed to send reply");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Bridge closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("Bridge connection closed");
}
