use crate::{auth::auth_handlers::SESSION_COOKIE, error::AppError, state::AppState};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::{AUTHORIZATION, COOKIE}, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&req)
        .ok_or(AppError::Unauthorized("Unauthorized - No token provided".to_string()))?;

    let user_id = state.auth_service.authenticate(&token).await?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}

/// Bearer header first, then the session cookie, then a `token` query
/// parameter (browsers cannot set headers on WebSocket/EventSource).
fn extract_token(req: &Request<Body>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        return auth_header
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
    }

    let from_cookie = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());

    if from_cookie.is_some() {
        return from_cookie;
    }

    req.uri()
        .query()
        .unwrap_or("")
        .split('&')
        .find_map(|param| param.strip_prefix("token="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

// Extractor for getting user_id from request extensions
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Uuid>()
            .copied()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))
    }
}
