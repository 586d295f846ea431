mod common;

use actix_web::{http::StatusCode, test, web::Bytes};
use async_trait::async_trait;
use contactbook::error::AppError;
use contactbook::models::{User, UserRole};
use contactbook::services::AvatarStore;
use std::sync::{Arc, Mutex};

use common::{admin_user, context, init_app, register_and_login_user, TestContext};

/// Remembers uploads and serves them from a fake CDN.
#[derive(Default)]
struct FakeAvatarStore {
    uploads: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl AvatarStore for FakeAvatarStore {
    async fn upload(
        &self,
        image: Bytes,
        content_type: &str,
        public_id: &str,
    ) -> Result<String, AppError> {
        self.uploads.lock().unwrap().push((
            public_id.to_string(),
            content_type.to_string(),
            image.len(),
        ));
        Ok(format!("https://cdn.example.com/{}", public_id))
    }
}

fn context_with_store() -> (TestContext, Arc<FakeAvatarStore>) {
    let store = Arc::new(FakeAvatarStore::default());
    let ctx = context();
    let state = ctx
        .state
        .get_ref()
        .clone()
        .with_avatar_store(store.clone());
    (
        TestContext {
            state: actix_web::web::Data::new(state),
            mailer: ctx.mailer,
        },
        store,
    )
}

#[actix_rt::test]
async fn test_me_returns_current_user() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(&app, &ctx.state, "me_user", "me@example.com", "password123")
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(user.bearer())
        .to_request();
    let me: User = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me.id, user.id);
    assert_eq!(me.username, "me_user");
    assert_eq!(me.role, UserRole::User);

    let req = test::TestRequest::get().uri("/api/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_me_is_rate_limited() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "chatty",
        "chatty@example.com",
        "password123",
    )
    .await
    .unwrap();

    for i in 0..7 {
        let req = test::TestRequest::get()
            .uri("/api/users/me")
            .insert_header(user.bearer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "request {} should pass", i + 1);
    }

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());

    // Other routes are not limited
    let req = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(user.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_avatar_requires_admin() {
    let (ctx, store) = context_with_store();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "regular",
        "regular@example.com",
        "password123",
    )
    .await
    .unwrap();

    let req = test::TestRequest::patch()
        .uri("/api/users/avatar")
        .insert_header(user.bearer())
        .insert_header(("Content-Type", "image/png"))
        .set_payload(vec![0x89, 0x50, 0x4e, 0x47])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(store.uploads.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_admin_updates_avatar() {
    let (ctx, store) = context_with_store();
    let app = init_app(ctx.state.clone()).await;
    let admin = admin_user(&app, &ctx.state, "boss", "boss@example.com")
        .await
        .unwrap();

    let req = test::TestRequest::patch()
        .uri("/api/users/avatar")
        .insert_header(admin.bearer())
        .insert_header(("Content-Type", "image/png"))
        .set_payload(vec![0x89, 0x50, 0x4e, 0x47])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: User = test::read_body_json(resp).await;
    assert_eq!(updated.id, admin.id);
    assert_eq!(
        updated.avatar.as_deref(),
        Some("https://cdn.example.com/ContactBook/boss")
    );
    assert_eq!(
        store.uploads.lock().unwrap().as_slice(),
        &[("ContactBook/boss".to_string(), "image/png".to_string(), 4)]
    );

    // Not an image
    let req = test::TestRequest::patch()
        .uri("/api/users/avatar")
        .insert_header(admin.bearer())
        .insert_header(("Content-Type", "text/plain"))
        .set_payload("hello")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    // Empty body
    let req = test::TestRequest::patch()
        .uri("/api/users/avatar")
        .insert_header(admin.bearer())
        .insert_header(("Content-Type", "image/jpeg"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[actix_rt::test]
async fn test_avatar_without_store() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let admin = admin_user(&app, &ctx.state, "boss", "boss@example.com")
        .await
        .unwrap();

    let req = test::TestRequest::patch()
        .uri("/api/users/avatar")
        .insert_header(admin.bearer())
        .insert_header(("Content-Type", "image/png"))
        .set_payload(vec![1, 2, 3])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_rt::test]
async fn test_avatar_too_large() {
    let (ctx, store) = context_with_store();
    let app = init_app(ctx.state.clone()).await;
    let admin = admin_user(&app, &ctx.state, "boss", "boss@example.com")
        .await
        .unwrap();

    let req = test::TestRequest::patch()
        .uri("/api/users/avatar")
        .insert_header(admin.bearer())
        .insert_header(("Content-Type", "image/png"))
        .set_payload(vec![0u8; 6 * 1024 * 1024])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store.uploads.lock().unwrap().is_empty());
}
