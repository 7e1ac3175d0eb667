use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use uuid::Uuid;

use crate::auth::Role;
use crate::error::AppError;
use crate::extract::AppQuery;
use crate::services::MemberEvent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Who is listening on a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Admin,
    Member(Uuid),
}

impl Audience {
    pub fn wants(&self, event: &MemberEvent) -> bool {
        match self {
            Audience::Admin => true,
            Audience::Member(id) => event.member_id == *id,
        }
    }
}

/// GET /ws/members?token=
///
/// The token is checked before the upgrade so a bad one gets a plain 401.
pub async fn member_events(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<WsQuery>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = query
        .token
        .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;
    let claims = state.jwt_service().verify_token(&token)?;
    let audience = match claims.role {
        Role::Admin => Audience::Admin,
        Role::Member => Audience::Member(claims.subject_id()?),
    };

    let events = BroadcastStream::new(state.broadcaster().subscribe());
    Ok(upgrade.on_upgrade(move |socket| pump(socket, events, audience)))
}

async fn pump(socket: WebSocket, mut events: BroadcastStream<MemberEvent>, audience: Audience) {
    tracing::info!("WebSocket listener connected: {:?}", audience);
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            next = events.next() => match next {
                Some(Ok(event)) if audience.wants(&event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to encode {}: {}", event.event, e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::warn!("WebSocket listener lagged, skipped {} event(s)", skipped);
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("WebSocket listener disconnected: {:?}", audience);
}
