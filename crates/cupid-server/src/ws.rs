//! WebSocket upgrade and per-session event loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, error, warn};

use cupid_core::ConversationManager;
use cupid_shared::protocol::{ClientEvent, ServerEvent};
use cupid_shared::{CoreError, CoreResult, SessionId};

use crate::api::AppState;
use crate::auth::{bearer_token, verify_token, AuthUser};
use crate::error::ServerError;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// Authenticate, enforce the connection limit, then upgrade.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> Response {
    let token = bearer_token(&headers).or(params.token.as_deref());
    let user = match token.map(|t| verify_token(t, &state.config.jwt_secret)) {
        Some(Ok(user)) => user,
        Some(Err(_)) | None => return ServerError::Unauthenticated.into_response(),
    };

    let max = state.config.max_ws_connections;
    let Some(slot) = ConnectionSlot::try_reserve(&state.ws_connections, max) else {
        warn!(user = %user.id, max, "Refusing WebSocket connection");
        return ServerError::TooManyConnections(max).into_response();
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    ws.on_upgrade(move |socket| ws_connection(socket, state, user, slot))
        .into_response()
}

/// One counted WebSocket connection. The count drops with the slot, so a
/// rejected or failed upgrade gives it back too.
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    fn try_reserve(counter: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .ok()
            .map(|_| Self(Arc::clone(counter)))
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn ws_connection(
    mut socket: WebSocket,
    state: AppState,
    user: AuthUser,
    _slot: ConnectionSlot,
) {
    let (session, mut rx) = state.notifier.connect(user.id).await;

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(event) = outbound else { break };
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(reply) = handle_frame(&state, session, &user, &text).await {
                            if send_event(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        if socket.send(WsMessage::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(session = %session, error = %e, "WebSocket receive failed");
                        break;
                    }
                }
            }
        }
    }

    state.notifier.disconnect(session).await;
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), axum::Error> {
    match event.to_json() {
        Ok(json) => socket.send(WsMessage::Text(json)).await,
        Err(e) => {
            error!(error = %e, "Failed to encode server event");
            Ok(())
        }
    }
}

/// Apply one client frame. The return value, if any, goes back to this
/// session only.
pub(crate) async fn handle_frame(
    state: &AppState,
    session: SessionId,
    user: &AuthUser,
    text: &str,
) -> Option<ServerEvent> {
    let event = match ClientEvent::from_json(text) {
        Ok(event) => event,
        Err(e) => {
            debug!(session = %session, error = %e, "Malformed client frame");
            return Some(ServerEvent::error(&CoreError::InvalidInput(format!(
                "malformed frame: {e}"
            ))));
        }
    };

    match apply(state, session, user, event).await {
        Ok(reply) => reply,
        Err(err) => {
            if let CoreError::Internal(ref detail) = err {
                error!(session = %session, user = %user.id, error = %detail, "Realtime request failed");
            } else {
                debug!(session = %session, user = %user.id, error = %err, "Realtime request rejected");
            }
            Some(ServerEvent::error(&err))
        }
    }
}

async fn apply(
    state: &AppState,
    session: SessionId,
    user: &AuthUser,
    event: ClientEvent,
) -> CoreResult<Option<ServerEvent>> {
    match event {
        ClientEvent::JoinConversation { conversation_id } => {
            let conversation = {
                let db = state.db.lock().await;
                ConversationManager::new(&*db).find_conversation(conversation_id)?
            };
            state
                .notifier
                .subscribe_conversation(session, &conversation)
                .await?;
            Ok(Some(ServerEvent::Joined { conversation_id }))
        }

        ClientEvent::LeaveConversation { conversation_id } => {
            state
                .notifier
                .unsubscribe_conversation(session, conversation_id)
                .await;
            Ok(None)
        }

        ClientEvent::SendMessage {
            conversation_id,
            message_text,
        } => {
            let message = {
                let db = state.db.lock().await;
                state
                    .message_store(&db)
                    .send_message(conversation_id, user.id, &message_text)?
            };
            state.notifier.broadcast_new_message(&message).await;
            Ok(None)
        }

        ClientEvent::Typing {
            conversation_id,
            is_typing,
        } => {
            if !state.notifier.is_subscribed(session, conversation_id).await {
                return Err(CoreError::Unauthorized(format!(
                    "join conversation {conversation_id} before typing in it"
                )));
            }
            state
                .notifier
                .broadcast_typing(user.id, &user.name, conversation_id, is_typing)
                .await;
            Ok(None)
        }

        ClientEvent::MarkRead { conversation_id } => {
            {
                let db = state.db.lock().await;
                state.message_store(&db).mark_read(conversation_id, user.id)?;
            }
            state
                .notifier
                .broadcast_read(conversation_id, user.id)
                .await;
            Ok(None)
        }
    }
}
