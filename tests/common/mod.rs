#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{body::MessageBody, dev::ServiceResponse, test, web, App};
use async_trait::async_trait;
use contactbook::auth::TokenResponse;
use contactbook::error::AppError;
use contactbook::models::{User, UserRole};
use contactbook::routes::{self, health};
use contactbook::services::{EmailMessage, Mailer};
use contactbook::state::AppState;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const JWT_SECRET: &str = "integration_test_secret";

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits for the background task to hand a message for `to` to the mailer.
    pub async fn wait_for(&self, to: &str) -> Option<EmailMessage> {
        for _ in 0..50 {
            if let Some(message) = self.sent().into_iter().rev().find(|m| m.to == to) {
                return Some(message);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

/// Extracts the `/api/auth/confirmed_email/{token}` path from a confirmation e-mail.
pub fn confirmation_path(message: &EmailMessage) -> String {
    let start = message
        .body
        .find("/api/auth/confirmed_email/")
        .expect("confirmation link in body");
    message.body[start..]
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn context() -> TestContext {
    let mailer = Arc::new(RecordingMailer::default());
    let state = web::Data::new(AppState::in_memory(JWT_SECRET).with_mailer(mailer.clone()));
    TestContext { state, mailer }
}

/// The application as `main` builds it, over the given state.
pub async fn init_app(
    state: web::Data<AppState>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(state)
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .app_data(routes::payload_config())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config)),
    )
    .await
}

pub struct TestUser {
    pub id: i32,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }
}

pub async fn login(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    password: &str,
) -> Result<String, String> {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    if !status.is_success() {
        return Err(format!(
            "Failed to log in. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let token: TokenResponse = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse login response: {}", e))?;
    Ok(token.access_token)
}

/// Registers through the API, confirms the address directly and logs in.
pub async fn register_and_login_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let user: User = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse registration response: {}", e))?;

    state
        .users
        .confirm_email(email)
        .await
        .map_err(|e| format!("Failed to confirm email: {}", e))?;

    let token = login(app, username, password).await?;
    Ok(TestUser { id: user.id, token })
}

/// Creates a confirmed administrator without going through the API and logs in.
pub async fn admin_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    state: &AppState,
    username: &str,
    email: &str,
) -> Result<TestUser, String> {
    let user = state
        .users
        .create_user(username, email, "admin_password", UserRole::Admin)
        .await
        .map_err(|e| format!("Failed to create admin: {}", e))?;
    state
        .users
        .confirm_email(email)
        .await
        .map_err(|e| format!("Failed to confirm email: {}", e))?;

    let token = login(app, username, "admin_password").await?;
    Ok(TestUser { id: user.id, token })
}
