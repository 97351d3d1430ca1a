//! Tests for users API handlers, run against the in-memory account stack.

use super::*;
use crate::domain::ports::{DocumentStore, StoreError};
use crate::domain::{Role, USER_COLLECTION};
use crate::inbound::http::routes::configure_api;
use crate::inbound::http::test_utils::{TestStack, test_session_middleware};
use crate::middleware::SessionLoader;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{App, ResponseError, test as actix_test, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use mongodb::bson::doc;
use rstest::rstest;
use serde_json::{Value, json};

const PASSWORD: &str = "correct horse";

macro_rules! init_app {
    ($stack:expr) => {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new($stack.state.clone()))
                .wrap(SessionLoader::new($stack.sessions.clone()))
                .wrap(test_session_middleware())
                .configure(configure_api),
        )
        .await
    };
}

struct Reply {
    status: StatusCode,
    cookie: Option<Cookie<'static>>,
    body: Value,
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).expect("json body")
    }
}

// Middleware rejections surface as service errors rather than responses.
async fn send<B>(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    request: actix_http::Request,
) -> Reply
where
    B: MessageBody,
{
    match actix_test::try_call_service(app, request).await {
        Ok(response) => {
            let status = response.status();
            let cookie = response
                .response()
                .cookies()
                .find(|c| c.name() == "session")
                .map(Cookie::into_owned);
            let bytes = actix_test::read_body(response).await;
            Reply {
                status,
                cookie,
                body: parse_body(&bytes),
            }
        }
        Err(error) => {
            let response = error.as_response_error().error_response();
            let status = response.status();
            let bytes = actix_web::body::to_bytes(response.into_body())
                .await
                .expect("error body");
            Reply {
                status,
                cookie: None,
                body: parse_body(&bytes),
            }
        }
    }
}

fn register_request(email: &str) -> actix_http::Request {
    actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({ "email": email, "password": PASSWORD, "displayName": "tester" }))
        .to_request()
}

fn login_request(email: &str, password: &str) -> actix_http::Request {
    actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(&LoginRequest {
            username: email.into(),
            password: password.into(),
        })
        .to_request()
}

fn get(uri: &str, cookie: Option<&Cookie<'static>>) -> actix_http::Request {
    let mut request = actix_test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie.clone());
    }
    request.to_request()
}

async fn register_and_login<B>(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    email: &str,
) -> Cookie<'static>
where
    B: MessageBody,
{
    let registered = send(app, register_request(email)).await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let login = send(app, login_request(email, PASSWORD)).await;
    assert_eq!(login.status, StatusCode::OK);
    login.cookie.expect("session cookie")
}

fn description(reply: &Reply) -> Option<&str> {
    reply.body.get("description").and_then(Value::as_str)
}

#[actix_web::test]
async fn register_returns_account_without_password() {
    let stack = TestStack::new();
    let app = init_app!(stack);

    let reply = send(&app, register_request("ada@example.com")).await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(
        reply.body.get("email").and_then(Value::as_str),
        Some("ada@example.com")
    );
    assert_eq!(
        reply.body.get("displayName").and_then(Value::as_str),
        Some("tester")
    );
    assert_eq!(
        reply.body.get("role").and_then(Value::as_u64),
        Some(u64::from(Role::USER.bits()))
    );
    assert!(reply.body.get("id").is_some());
    assert!(reply.body.get("password").is_none());
}

#[actix_web::test]
async fn duplicate_registration_conflicts() {
    let stack = TestStack::new();
    let app = init_app!(stack);

    send(&app, register_request("ada@example.com")).await;
    let reply = send(&app, register_request("ada@example.com")).await;

    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(
        reply.body.get("code").and_then(Value::as_str),
        Some("conflict")
    );
    assert_eq!(stack.documents.documents(USER_COLLECTION).len(), 1);
}

#[rstest]
#[case(json!({ "email": "not-an-email", "password": PASSWORD }))]
#[case(json!({ "email": "ada@example.com", "password": "" }))]
#[actix_web::test]
async fn invalid_registration_is_rejected(#[case] body: Value) {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(body)
        .to_request();

    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(stack.documents.documents(USER_COLLECTION).is_empty());
}

#[actix_web::test]
async fn wrong_password_opens_no_session() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    send(&app, register_request("ada@example.com")).await;

    let reply = send(&app, login_request("ada@example.com", "wrong")).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.cookie.is_none());
    assert!(stack.sessions.is_empty().expect("session map"));
}

#[actix_web::test]
async fn unknown_user_cannot_log_in() {
    let stack = TestStack::new();
    let app = init_app!(stack);

    let reply = send(&app, login_request("nobody@example.com", PASSWORD)).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        reply.body.get("title").and_then(Value::as_str),
        Some("Authorization Error")
    );
}

#[actix_web::test]
async fn basic_header_login_records_connection() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    send(&app, register_request("ada@example.com")).await;
    let header = format!("Basic {}", STANDARD.encode(format!("ada@example.com:{PASSWORD}")));
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .insert_header((AUTHORIZATION, header))
        .to_request();

    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.cookie.is_some());
    assert!(reply.body.get("lastConnection").is_some());
    let stored = stack.documents.documents(USER_COLLECTION);
    assert!(stored[0].contains_key("lastconnection"));
}

#[actix_web::test]
async fn me_requires_a_session() {
    let stack = TestStack::new();
    let app = init_app!(stack);

    let reply = send(&app, get("/api/v1/users/me", None)).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(description(&reply), Some("no session user"));
}

#[actix_web::test]
async fn me_returns_the_logged_in_account() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let cookie = register_and_login(&app, "ada@example.com").await;

    let reply = send(&app, get("/api/v1/users/me", Some(&cookie))).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body.get("email").and_then(Value::as_str),
        Some("ada@example.com")
    );
    assert_eq!(
        reply.body.get("roles").and_then(Value::as_str),
        Some("USER")
    );
}

#[actix_web::test]
async fn second_login_with_live_session_is_refused() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let cookie = register_and_login(&app, "ada@example.com").await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .cookie(cookie)
        .set_json(&LoginRequest {
            username: "ada@example.com".into(),
            password: PASSWORD.into(),
        })
        .to_request();

    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stack.sessions.len().expect("session map"), 1);
}

#[rstest]
#[case("", PASSWORD)]
#[case("ada@example.com", "")]
#[actix_web::test]
async fn blank_login_fields_are_unauthorised(#[case] username: &str, #[case] password: &str) {
    let stack = TestStack::new();
    let app = init_app!(stack);
    send(&app, register_request("ada@example.com")).await;

    let reply = send(&app, login_request(username, password)).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(
        description(&reply).is_some_and(|text| text.contains("must not be empty")),
        "unexpected body: {}",
        reply.body
    );
    assert!(stack.sessions.is_empty().expect("session map"));
}

#[actix_web::test]
async fn blank_password_with_live_session_reports_existing_session() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let cookie = register_and_login(&app, "ada@example.com").await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .cookie(cookie)
        .set_json(&LoginRequest {
            username: "ada@example.com".into(),
            password: String::new(),
        })
        .to_request();

    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        description(&reply),
        Some("already authenticated as ada@example.com")
    );
}

#[actix_web::test]
async fn failed_connection_save_revokes_the_new_session() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    send(&app, register_request("ada@example.com")).await;
    stack
        .documents
        .fail_upserts_into(USER_COLLECTION, StoreError::connection("reset by peer"));

    let reply = send(&app, login_request("ada@example.com", PASSWORD)).await;

    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(reply.cookie.is_none());
    assert!(stack.sessions.is_empty().expect("session map"));
}

#[actix_web::test]
async fn random_user_requires_admin_role() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let cookie = register_and_login(&app, "ada@example.com").await;

    let denied = send(&app, get("/api/v1/users/random", Some(&cookie))).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    stack
        .documents
        .find_one_and_update(
            USER_COLLECTION,
            doc! { "email": "ada@example.com" },
            doc! { "$set": { "role": i64::from(Role::ADMIN.bits()) } },
        )
        .await
        .expect("promote to admin");
    let logout = actix_test::TestRequest::post()
        .uri("/api/v1/logout")
        .cookie(cookie)
        .to_request();
    send(&app, logout).await;
    let login = send(&app, login_request("ada@example.com", PASSWORD)).await;
    let admin = login.cookie.expect("admin cookie");

    let reply = send(&app, get("/api/v1/users/random", Some(&admin))).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body.get("email").and_then(Value::as_str),
        Some("ada@example.com")
    );
}

#[actix_web::test]
async fn friends_can_be_added_and_removed() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let registered = send(&app, register_request("grace@example.com")).await;
    let friend_id = registered
        .body
        .get("id")
        .and_then(Value::as_str)
        .expect("friend id")
        .to_owned();
    let cookie = register_and_login(&app, "ada@example.com").await;
    let add = || {
        actix_test::TestRequest::post()
            .uri("/api/v1/users/me/friends")
            .cookie(cookie.clone())
            .set_json(json!({ "email": "grace@example.com" }))
            .to_request()
    };
    let remove = || {
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/users/me/friends/{friend_id}"))
            .cookie(cookie.clone())
            .to_request()
    };

    let added = send(&app, add()).await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(
        added.body.pointer("/friends/0/email").and_then(Value::as_str),
        Some("grace@example.com")
    );

    let duplicate = send(&app, add()).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let removed = send(&app, remove()).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(
        removed.body.get("friends").and_then(Value::as_array).map(Vec::len),
        Some(0)
    );

    let missing = send(&app, remove()).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn befriending_yourself_is_a_bad_request() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let cookie = register_and_login(&app, "ada@example.com").await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/users/me/friends")
        .cookie(cookie)
        .set_json(json!({ "email": "ada@example.com" }))
        .to_request();

    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.body.get("title").and_then(Value::as_str),
        Some("Friend Error")
    );
}

#[actix_web::test]
async fn logout_ends_the_session() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let cookie = register_and_login(&app, "ada@example.com").await;
    let logout = actix_test::TestRequest::post()
        .uri("/api/v1/logout")
        .cookie(cookie.clone())
        .to_request();

    let reply = send(&app, logout).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(stack.sessions.is_empty().expect("session map"));

    let me = send(&app, get("/api/v1/users/me", Some(&cookie))).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn logout_without_session_is_unauthorised() {
    let stack = TestStack::new();
    let app = init_app!(stack);
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/logout")
        .to_request();

    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}
