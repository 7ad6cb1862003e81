use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    auth::auth_dto::{LoginRequest, LoginResponse, LogoutResponse, SignupRequest},
    error::{AppError, Result},
    extract::AppJson,
    middleware::AuthUser,
    state::{AppState, Config},
    user::UserResponse,
};

pub const SESSION_COOKIE: &str = "jwt";

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created; session cookie set", body = UserResponse),
        (status = 400, description = "Missing fields, mismatched passwords, invalid input or duplicate username")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse> {
    let (user, token) = state.auth_service.signup(payload).await?;
    let headers = session_headers(&state.config, &token)?;

    Ok((StatusCode::CREATED, headers, Json(UserResponse::from(user))))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 400, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let (user, token) = state.auth_service.login(payload).await?;
    let headers = session_headers(&state.config, &token)?;

    Ok((StatusCode::OK, headers, Json(LoginResponse::new(user, token))))
}

/// Log out by clearing the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session cookie cleared", body = LogoutResponse)
    )
)]
pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        cookie_header(&session_cookie("", 0, state.config.cookie_secure))?,
    );

    Ok((
        StatusCode::OK,
        headers,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.current_user(user_id).await?;

    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

fn session_headers(config: &Config, token: &str) -> Result<HeaderMap> {
    let max_age = config.jwt_expiration_hours.max(0) * 60 * 60;
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        cookie_header(&session_cookie(token, max_age, config.cookie_secure))?,
    );
    Ok(headers)
}

fn cookie_header(cookie: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(cookie).map_err(|e| {
        tracing::error!("Invalid session cookie header: {}", e);
        AppError::InternalError
    })
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
