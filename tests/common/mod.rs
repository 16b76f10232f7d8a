#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, Method, StatusCode},
    middleware::Logger,
    test, web, App, Error,
};
use checklistd::{
    auth::{AuthMiddleware, PasswordHasher, TokenService},
    routes, MemoryStore, Store,
};
use chrono::Duration;
use serde_json::{json, Value};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "12345678";

pub fn token_service() -> TokenService {
    TokenService::new(TEST_SECRET, Duration::hours(1))
}

/// The full `/api` surface over a fresh in-memory store.
pub async fn spawn_app(
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let tokens = web::Data::new(token_service());

    test::init_service(
        App::new()
            .app_data(web::Data::from(store))
            .app_data(tokens.clone())
            .app_data(web::Data::new(PasswordHasher::new(4)))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens))
                    .configure(routes::config),
            ),
    )
    .await
}

fn build(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request {
    let mut req = test::TestRequest::default().method(method).uri(uri);
    if let Some(token) = token {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    req.to_request()
}

/// Sends an authenticated request and returns the status with the parsed body
/// (`Value::Null` when the body is not JSON).
pub async fn send<S, B>(
    app: &S,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, build(method, uri, Some(token), body)).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Status of a request that may be rejected by the auth middleware before it
/// reaches a handler.
pub async fn status_of<S, B>(
    app: &S,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> StatusCode
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    match test::try_call_service(app, build(method, uri, token, body)).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}

/// Registers a user and returns `(token, user id)`.
pub async fn register<S, B>(app: &S, email: &str) -> (String, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": "Test User", "email": email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "registering {}", email);

    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().expect("token in response").to_string();
    let user_id = body["user"]["id"].as_str().expect("user id in response").to_string();
    (token, user_id)
}

pub async fn create_checklist<S, B>(app: &S, token: &str, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        Method::POST,
        "/api/checklists",
        token,
        Some(json!({ "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "creating checklist {}: {}", title, body);
    body
}

pub async fn create_task<S, B>(app: &S, token: &str, checklist_id: &str, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        Method::POST,
        "/api/tasks",
        token,
        Some(json!({ "title": title, "checklistId": checklist_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "creating task {}: {}", title, body);
    body
}
