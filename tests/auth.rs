mod common;

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{
    cookie::Cookie,
    http::{Method, StatusCode},
    middleware::Logger,
    rt, test, web, App, HttpServer,
};
use checklistd::{
    auth::{AuthMiddleware, AuthResponse, PasswordHasher},
    routes, MemoryStore, Store,
};
use common::{register, send, spawn_app, status_of, token_service, PASSWORD};
use pretty_assertions::assert_eq;
use serde_json::json;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let app = spawn_app().await;

    let register_payload = json!({
        "name": "Ada",
        "email": "a@x.com",
        "password": PASSWORD
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );
    let registered: AuthResponse =
        serde_json::from_slice(&body_bytes).expect("Failed to parse register response JSON");
    assert!(!registered.token.is_empty());
    assert_eq!(registered.user.email, "a@x.com");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::CONFLICT,
        "Duplicate registration did not fail as expected"
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "A@X.com ", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(login.user.id, registered.user.id);

    // The freshly issued token opens the protected routes.
    let (status, checklists) = send(&app, Method::GET, "/api/checklists", &login.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checklists, json!([]));
}

#[actix_rt::test]
async fn test_invalid_credentials_and_inputs() {
    let app = spawn_app().await;
    register(&app, "a@x.com").await;

    let test_cases = vec![
        (
            "/api/auth/register",
            json!({ "email": "b@x.com", "password": PASSWORD }),
            StatusCode::BAD_REQUEST,
            "missing name",
        ),
        (
            "/api/auth/register",
            json!({ "name": "B", "email": "not-an-email", "password": PASSWORD }),
            StatusCode::BAD_REQUEST,
            "invalid email format",
        ),
        (
            "/api/auth/register",
            json!({ "name": "B", "email": "b@x.com", "password": "1234567" }),
            StatusCode::BAD_REQUEST,
            "password too short",
        ),
        (
            "/api/auth/login",
            json!({ "email": "a@x.com" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            "/api/auth/login",
            json!({ "email": "a@x.com", "password": "wrong-password" }),
            StatusCode::UNAUTHORIZED,
            "incorrect password",
        ),
        (
            "/api/auth/login",
            json!({ "email": "nobody@x.com", "password": PASSWORD }),
            StatusCode::UNAUTHORIZED,
            "non-existent user",
        ),
    ];

    for (uri, payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri(uri)
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: serde_json::Value = test::read_body_json(resp).await;

        assert_eq!(
            status, expected_status,
            "Test case failed: {}. Body: {}",
            description, body
        );
        assert!(body["error"].is_string(), "{}: error body {}", description, body);
    }
}

#[actix_rt::test]
async fn test_token_requirements() {
    let app = spawn_app().await;

    assert_eq!(
        status_of(&app, Method::GET, "/api/health", None, None).await,
        StatusCode::OK
    );
    assert_eq!(
        status_of(&app, Method::GET, "/api/checklists", None, None).await,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        status_of(&app, Method::GET, "/api/checklists", Some("not.a.jwt"), None).await,
        StatusCode::BAD_REQUEST
    );

    // A token from another signing key is just as invalid.
    let foreign = checklistd::auth::TokenService::new("some-other-secret", chrono::Duration::hours(1))
        .issue(uuid::Uuid::new_v4())
        .unwrap();
    assert_eq!(
        status_of(&app, Method::GET, "/api/tasks/pinned", Some(&foreign), None).await,
        StatusCode::BAD_REQUEST
    );

    // A well-signed token with no user id claim is rejected as unauthenticated.
    let claims = json!({ "iat": 0, "exp": usize::MAX / 2 });
    let anonymous = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(common::TEST_SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(
        status_of(&app, Method::GET, "/api/checklists", Some(&anonymous), None).await,
        StatusCode::UNAUTHORIZED
    );

    // An empty `_id` does not hide a usable `userId`.
    let (_, user_id) = register(&app, "claims@x.com").await;
    let claims = json!({ "_id": "", "userId": user_id, "iat": 0, "exp": usize::MAX / 2 });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(common::TEST_SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(
        status_of(&app, Method::GET, "/api/checklists", Some(&token), None).await,
        StatusCode::OK
    );
}

#[actix_rt::test]
async fn test_token_accepted_from_cookie() {
    let app = spawn_app().await;
    let (token, _) = register(&app, "cookie@x.com").await;

    let req = test::TestRequest::get()
        .uri("/api/checklists")
        .cookie(Cookie::new("token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test_log::test(actix_rt::test)]
async fn test_create_task_unauthorized_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let store = web::Data::from(store);
    let tokens = web::Data::new(token_service());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(tokens.clone())
            .app_data(web::Data::new(PasswordHasher::new(4)))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .configure(routes::config),
            )
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let client = reqwest::Client::new();
    let request = client
        .post(format!("http://127.0.0.1:{}/api/tasks", port))
        .json(&json!({ "title": "Unauthorized Task", "checklistId": uuid::Uuid::new_v4() }))
        .send();
    let resp = tokio::time::timeout(std::time::Duration::from_secs(5), request)
        .await
        .expect("Server did not answer in time")
        .expect("Failed to send request");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("JSON error body");
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED, "Body: {}", body);
    assert_eq!(body["error"], "Access denied: missing token");

    handle.stop(true).await;
}
