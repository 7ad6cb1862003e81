use crate::{
    auth::{
        auth_dto::{LoginRequest, LoginResponse, LogoutResponse, SignupRequest},
        auth_handlers,
    },
    message::{
        message_dto::SendMessageRequest,
        message_handlers,
        message_models::MessageResponse,
    },
    middleware::auth_middleware,
    state::AppState,
    user::{Gender, SidebarUser, UserResponse},
};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::auth_handlers::signup,
        crate::auth::auth_handlers::login,
        crate::auth::auth_handlers::logout,
        crate::auth::auth_handlers::me,
        crate::message::message_handlers::send_message,
        crate::message::message_handlers::get_messages,
        crate::message::message_handlers::get_sidebar_users,
        crate::message::message_handlers::message_stream,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            LoginResponse,
            LogoutResponse,
            UserResponse,
            SidebarUser,
            Gender,
            SendMessageRequest,
            MessageResponse,
        )
    ),
    tags(
        (name = "auth", description = "Account and session endpoints"),
        (name = "messages", description = "Direct messaging endpoints")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/signup", post(auth_handlers::signup))
        .route("/login", post(auth_handlers::login))
        .route("/logout", post(auth_handlers::logout))
        .merge(
            Router::new()
                .route("/me", get(auth_handlers::me))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let message_routes = Router::new()
        .route("/send/:receiver_id", post(message_handlers::send_message))
        .route("/conversations", get(message_handlers::get_sidebar_users))
        .route("/stream", get(message_handlers::message_stream))
        .route("/:other_user_id", get(message_handlers::get_messages))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // WebSocket route
    let ws_routes = Router::new()
        .route("/ws", get(crate::websocket::ws_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/messages", message_routes)
        .merge(ws_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header::SET_COOKIE, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_with(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn signup_body(username: &str) -> Value {
        json!({
            "fullName": format!("{} Example", username),
            "username": username,
            "password": "secret1",
            "confirmPassword": "secret1",
            "gender": "female",
        })
    }

    /// Signs a user up and returns (user id, session token).
    async fn signup(app: &Router, username: &str) -> (String, String) {
        let response = send(app, post_json("/api/auth/signup", None, signup_body(username))).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap()
            .to_string();
        let token = cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("jwt="))
            .unwrap()
            .to_string();

        let user = body_json(response).await;
        (user["id"].as_str().unwrap().to_string(), token)
    }

    #[tokio::test]
    async fn test_signup_sets_session_cookie() {
        let app = create_router(test_state());
        let response = send(&app, post_json("/api/auth/signup", None, signup_body("ada"))).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("jwt="));
        assert!(cookie.contains("HttpOnly"));

        let user = body_json(response).await;
        assert_eq!(user["username"], "ada");
        assert_eq!(user["fullName"], "ada Example");
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_signup_errors_are_bad_requests() {
        let app = create_router(test_state());
        signup(&app, "ada").await;

        let duplicate = send(&app, post_json("/api/auth/signup", None, signup_body("ada"))).await;
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

        let mut mismatch = signup_body("grace");
        mismatch["confirmPassword"] = json!("other-pass");
        let response = send(&app, post_json("/api/auth/signup", None, mismatch)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Passwords don't match");

        let response = send(
            &app,
            post_json("/api/auth/signup", None, json!({ "username": "grace" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Please fill in all fields");
    }

    #[tokio::test]
    async fn test_send_then_read_history_from_both_sides() {
        let app = create_router(test_state());
        let (alice, alice_token) = signup(&app, "alice").await;
        let (bob, bob_token) = signup(&app, "bob").await;

        let response = send(
            &app,
            post_json(
                &format!("/api/messages/send/{}", bob),
                Some(&alice_token),
                json!({ "message": "hi" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let sent = body_json(response).await;
        assert_eq!(sent["body"], "hi");
        assert_eq!(sent["senderId"], alice.as_str());

        let response = send(
            &app,
            post_json(
                &format!("/api/messages/send/{}", alice),
                Some(&bob_token),
                json!({ "message": "yo" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let reply = body_json(response).await;
        assert_eq!(reply["conversationId"], sent["conversationId"]);

        let response = send(&app, get_with(&format!("/api/messages/{}", alice), &bob_token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let history = body_json(response).await;
        let bodies: Vec<&str> = history
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["body"].as_str().unwrap())
            .collect();
        assert_eq!(bodies, vec!["hi", "yo"]);
        assert_eq!(history[0]["senderId"], alice.as_str());
        assert_eq!(history[1]["senderId"], bob.as_str());
    }

    #[tokio::test]
    async fn test_history_without_conversation_is_empty() {
        let app = create_router(test_state());
        let (_, alice_token) = signup(&app, "alice").await;
        let (bob, _) = signup(&app, "bob").await;

        let response = send(&app, get_with(&format!("/api/messages/{}", bob), &alice_token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_send_rejects_empty_body_and_unknown_receiver() {
        let app = create_router(test_state());
        let (_, alice_token) = signup(&app, "alice").await;
        let (bob, _) = signup(&app, "bob").await;

        let response = send(
            &app,
            post_json(
                &format!("/api/messages/send/{}", bob),
                Some(&alice_token),
                json!({ "message": "" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            post_json(
                &format!("/api/messages/send/{}", uuid::Uuid::new_v4()),
                Some(&alice_token),
                json!({ "message": "hello?" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = create_router(test_state());
        let (bob, _) = signup(&app, "bob").await;

        let response = send(
            &app,
            post_json(
                &format!("/api/messages/send/{}", bob),
                None,
                json!({ "message": "hi" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, get_with("/api/messages/conversations", "not-a-jwt")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_sidebar_lists_other_users() {
        let app = create_router(test_state());
        let (_, alice_token) = signup(&app, "alice").await;
        let (bob, _) = signup(&app, "bob").await;

        let response = send(&app, get_with("/api/messages/conversations", &alice_token)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let users = body_json(response).await;
        let users = users.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["id"], bob.as_str());
        assert_eq!(users[0]["fullName"], "bob Example");
    }

    #[tokio::test]
    async fn test_login_me_and_logout() {
        let app = create_router(test_state());
        let (alice, _) = signup(&app, "alice").await;

        let response = send(
            &app,
            post_json(
                "/api/auth/login",
                None,
                json!({ "username": "alice", "password": "secret1" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let login = body_json(response).await;
        let token = login["token"].as_str().unwrap().to_string();

        let response = send(&app, get_with("/api/auth/me", &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], alice.as_str());

        let response = send(&app, post_json("/api/auth/logout", None, json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    async fn assert_json_bad_request(response: Response) {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].is_string(), "unexpected body: {}", body);
    }

    #[tokio::test]
    async fn test_malformed_path_is_json_bad_request() {
        let app = create_router(test_state());
        let (_, alice_token) = signup(&app, "alice").await;

        let response = send(&app, get_with("/api/messages/not-a-uuid", &alice_token)).await;
        assert_json_bad_request(response).await;

        let response = send(
            &app,
            post_json("/api/messages/send/not-a-uuid", Some(&alice_token), json!({ "message": "hi" })),
        )
        .await;
        assert_json_bad_request(response).await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let app = create_router(test_state());
        let (_, alice_token) = signup(&app, "alice").await;
        let (bob, _) = signup(&app, "bob").await;
        let uri = format!("/api/messages/send/{}", bob);

        // Wrong field type
        let response = send(&app, post_json(&uri, Some(&alice_token), json!({ "message": 5 }))).await;
        assert_json_bad_request(response).await;

        // Missing Content-Type
        let request = Request::builder()
            .method("POST")
            .uri(&uri)
            .header(AUTHORIZATION, format!("Bearer {}", alice_token))
            .body(Body::from(json!({ "message": "hi" }).to_string()))
            .unwrap();
        assert_json_bad_request(send(&app, request).await).await;

        // Not JSON at all
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        assert_json_bad_request(send(&app, request).await).await;
    }

    #[tokio::test]
    async fn test_signup_checks_trimmed_username() {
        let app = create_router(test_state());

        let response = send(&app, post_json("/api/auth/signup", None, signup_body("  ab  "))).await;
        assert_json_bad_request(response).await;

        let response = send(&app, post_json("/api/auth/signup", None, signup_body("  ada  "))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["username"], "ada");
    }
}
