//! WebSocket handler
//!
//! The per-connection event protocol: `start_recording` triggers the fixed
//! greeting, `message` runs one conversational turn, and `user_speaking`
//! signals barge-in (the active audio stream is stopped before the next
//! utterance arrives). Unknown or malformed events are rejected without
//! closing the session.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsFrame, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use sales_agent_agent::AgentError;

use crate::session::Session;
use crate::state::AppState;

/// Inbound client events
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Start of the call: deliver the greeting
    StartRecording,
    /// One user utterance
    Message { text: String },
    /// The user started speaking over the agent (barge-in)
    UserSpeaking,
}

/// Outbound server events
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionInfo {
        session_id: String,
    },
    AiResponse {
        text: String,
        /// Base64-encoded audio, absent when synthesis failed
        audio: Option<String>,
        end_call: bool,
    },
    Error {
        message: String,
    },
}

/// Handle WebSocket upgrade for an existing session
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, StatusCode> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session, state)))
}

async fn handle_socket(socket: WebSocket, session: Arc<Session>, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    send_event(
        &mut sender,
        &ServerEvent::SessionInfo {
            session_id: session.id.clone(),
        },
    )
    .await;

    while let Some(frame) = receiver.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(session = %session.id, error = %e, "WebSocket receive error");
                break;
            }
        };

        match frame {
            WsFrame::Text(text) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        send_event(
                            &mut sender,
                            &ServerEvent::Error {
                                message: format!("unknown or malformed action: {e}"),
                            },
                        )
                        .await;
                        continue;
                    }
                };

                if handle_event(event, &session, &mut sender).await.is_break() {
                    break;
                }
            }
            WsFrame::Close(_) => break,
            _ => {}
        }
    }

    session.playback.stop_current_stream().await;
    state.sessions.remove(&session.id);
    tracing::info!(session = %session.id, "WebSocket connection closed");
}

async fn handle_event(
    event: ClientEvent,
    session: &Arc<Session>,
    sender: &mut SplitSink<WebSocket, WsFrame>,
) -> ControlFlow<()> {
    session.touch();

    match event {
        ClientEvent::StartRecording => {
            let outcome = {
                let mut agent = session.agent.lock().await;
                agent.start_recording().await
            };
            deliver(session, sender, outcome.text, outcome.audio, false).await;
            ControlFlow::Continue(())
        }

        ClientEvent::UserSpeaking => {
            // Barge-in: stop the active stream before the interrupting
            // utterance arrives as a message event.
            session.playback.stop_current_stream().await;
            ControlFlow::Continue(())
        }

        ClientEvent::Message { text } => {
            let result = {
                let mut agent = session.agent.lock().await;
                agent.handle_utterance(&text).await
            };

            match result {
                Ok(outcome) => {
                    let end_call = outcome.end_call;
                    deliver(session, sender, outcome.text, outcome.audio, end_call).await;
                    if end_call {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                }
                Err(AgentError::CallEnded) => {
                    send_event(
                        &mut *sender,
                        &ServerEvent::Error {
                            message: "call has ended".to_string(),
                        },
                    )
                    .await;
                    ControlFlow::Break(())
                }
                Err(e) => {
                    send_event(
                        &mut *sender,
                        &ServerEvent::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
                    ControlFlow::Continue(())
                }
            }
        }
    }
}

/// Register the outgoing audio stream and send the response event
async fn deliver(
    session: &Arc<Session>,
    sender: &mut SplitSink<WebSocket, WsFrame>,
    text: String,
    audio: Option<Vec<u8>>,
    end_call: bool,
) {
    let encoded = match audio {
        Some(bytes) => {
            let _handle = session.playback.start_new_stream(bytes.clone()).await;
            Some(BASE64.encode(bytes))
        }
        None => None,
    };

    send_event(
        sender,
        &ServerEvent::AiResponse {
            text,
            audio: encoded,
            end_call,
        },
    )
    .await;
}

async fn send_event(sender: &mut SplitSink<WebSocket, WsFrame>, event: &ServerEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            if let Err(e) = sender.send(WsFrame::Text(json)).await {
                tracing::debug!(error = %e, "WebSocket send failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize server event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_parsing() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"action": "message", "text": "hello"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Message { text } if text == "hello"));

        let event: ClientEvent = serde_json::from_str(r#"{"action": "user_speaking"}"#).unwrap();
        assert!(matches!(event, ClientEvent::UserSpeaking));

        let event: ClientEvent = serde_json::from_str(r#"{"action": "start_recording"}"#).unwrap();
        assert!(matches!(event, ClientEvent::StartRecording));
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"action": "dance"}"#).is_err());
        assert!(serde_json::from_str::<ClientEvent>("not json").is_err());
    }

    #[test]
    fn test_server_event_wire_shape() {
        let json = serde_json::to_value(ServerEvent::AiResponse {
            text: "hi".to_string(),
            audio: Some("AAA=".to_string()),
            end_call: false,
        })
        .unwrap();

        assert_eq!(json["type"], "ai_response");
        assert_eq!(json["text"], "hi");
        assert_eq!(json["audio"], "AAA=");
        assert_eq!(json["end_call"], false);
    }
}
