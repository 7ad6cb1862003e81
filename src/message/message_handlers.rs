use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::Result,
    extract::{AppJson, AppPath},
    message::{
        message_dto::SendMessageRequest,
        message_models::MessageResponse,
    },
    middleware::AuthUser,
    notification::Delivery,
    state::AppState,
};

/// Send a message to another user
#[utoipa::path(
    post,
    path = "/api/messages/send/{receiver_id}",
    tag = "messages",
    params(
        ("receiver_id" = Uuid, Path, description = "User receiving the message")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message sent", body = MessageResponse),
        (status = 400, description = "Empty message body or message to self"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Receiver not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(receiver_id): AppPath<Uuid>,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let message = state
        .message_service
        .send_message(user_id, receiver_id, &payload.message)
        .await?;

    Ok((StatusCode::OK, Json(MessageResponse::from(message))))
}

/// Get the message history with another user, oldest first
#[utoipa::path(
    get,
    path = "/api/messages/{other_user_id}",
    tag = "messages",
    params(
        ("other_user_id" = Uuid, Path, description = "Other participant of the conversation")
    ),
    responses(
        (status = 200, description = "Messages in creation order (empty if no conversation yet)", body = Vec<MessageResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(other_user_id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let messages: Vec<MessageResponse> = state
        .message_service
        .get_messages(user_id, other_user_id)
        .await?
        .into_iter()
        .map(MessageResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(messages)))
}

/// List the users shown in the chat sidebar
#[utoipa::path(
    get,
    path = "/api/messages/conversations",
    tag = "messages",
    responses(
        (status = 200, description = "Every other user", body = Vec<crate::user::SidebarUser>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_sidebar_users(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let users = state.message_service.get_sidebar_users(user_id).await?;

    Ok((StatusCode::OK, Json(users)))
}

/// Subscribe to incoming messages via Server-Sent Events
#[utoipa::path(
    get,
    path = "/api/messages/stream",
    tag = "messages",
    responses(
        (status = 200, description = "SSE stream of `new_message` events"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn message_stream(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = deliveries_for(state.message_tx.subscribe(), user_id).filter_map(|message| {
        let json = serde_json::to_string(&message).ok()?;
        Some(Ok(Event::default().event("new_message").data(json)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Messages published on the delivery channel that are addressed to `user_id`.
fn deliveries_for(
    rx: broadcast::Receiver<Delivery>,
    user_id: Uuid,
) -> impl Stream<Item = MessageResponse> {
    BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(delivery) if delivery.receiver_id == user_id => Some(delivery.message),
        Ok(_) => None,
        Err(e) => {
            // Lagged subscribers skip ahead; history stays authoritative.
            tracing::warn!("Message stream for {} dropped events: {}", user_id, e);
            None
        }
    })
}
