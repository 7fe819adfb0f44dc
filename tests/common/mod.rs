#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{http::header, test};
use serde_json::{json, Value};
use std::sync::Arc;

use tasklane::auth::{AuthResponse, JwtKeys, PasswordCost};
use tasklane::models::TaskAccess;
use tasklane::{AppState, MemoryStore};

pub const TEST_SECRET: &[u8] = b"integration_test_secret_0123456789abcdef";

/// Fresh in-memory state with a cheap bcrypt cost.
pub fn test_state(task_access: TaskAccess) -> AppState {
    AppState {
        store: Arc::new(MemoryStore::new()),
        keys: JwtKeys::new(TEST_SECRET, 24),
        password_cost: PasswordCost(4),
        task_access,
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Sends a request and returns the status with the parsed JSON body
/// (`Value::Null` when the body is empty or not JSON).
pub async fn send<S, B>(app: &S, req: actix_http::Request) -> (actix_web::http::StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn register<S, B>(app: &S, username: &str, password: &str, name: &str) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "username": username, "password": password, "name": name }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, 201, "registration of {} failed: {}", username, body);
    body
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> AuthResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, 200, "login of {} failed: {}", username, body);
    serde_json::from_value(body).expect("Failed to parse login response JSON")
}

/// Registers and logs in, returning the login response with its token and user.
pub async fn signed_in<S, B>(app: &S, username: &str) -> AuthResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    register(app, username, "Password123!", username).await;
    login(app, username, "Password123!").await
}
