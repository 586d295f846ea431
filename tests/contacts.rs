mod common;

use actix_web::{http::StatusCode, test};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use contactbook::models::Contact;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{context, init_app, register_and_login_user};

fn contact_payload(
    first_name: &str,
    email: &str,
    birth_date: Option<NaiveDate>,
) -> serde_json::Value {
    json!({
        "first_name": first_name,
        "last_name": "Wilson",
        "email": email,
        "phone_number": "+1 (555) 010-2030",
        "birth_date": birth_date,
        "additional_info": "Met at the comic con"
    })
}

/// A birth date in 1990 whose anniversary falls `offset` days from today.
fn birth_date_in(offset: i64) -> NaiveDate {
    let target = Utc::now().date_naive() + Duration::days(offset);
    // 29 Feb is moved by the anniversary rule, keep the fixture clear of it.
    let target = if target.month() == 2 && target.day() == 29 {
        target + Duration::days(1)
    } else {
        target
    };
    NaiveDate::from_ymd_opt(1990, target.month(), target.day()).unwrap()
}

#[actix_rt::test]
async fn test_create_contact_unauthorized() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .set_json(contact_payload("Wade", "wade@example.com", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Could not validate credentials");
}

#[actix_rt::test]
async fn test_contact_crud_flow() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "crud_user",
        "crud@example.com",
        "password123",
    )
    .await
    .unwrap();

    // Create
    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(user.bearer())
        .set_json(contact_payload("Wade", "wade@example.com", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Contact = test::read_body_json(resp).await;
    assert_eq!(created.first_name, "Wade");
    assert_eq!(created.user_id, user.id);

    // Read
    let req = test::TestRequest::get()
        .uri(&format!("/api/contacts/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let fetched: Contact = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, created);

    // Update replaces every field
    let mut update = contact_payload(
        "Wade",
        "deadpool@example.com",
        NaiveDate::from_ymd_opt(1991, 2, 1),
    );
    update["additional_info"] = serde_json::Value::Null;
    let req = test::TestRequest::put()
        .uri(&format!("/api/contacts/{}", created.id))
        .insert_header(user.bearer())
        .set_json(&update)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Contact = test::read_body_json(resp).await;
    assert_eq!(updated.email, "deadpool@example.com");
    assert_eq!(updated.birth_date, NaiveDate::from_ymd_opt(1991, 2, 1));
    assert_eq!(updated.additional_info, None);
    assert!(updated.updated_at >= created.updated_at);

    // List
    let req = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(user.bearer())
        .to_request();
    let listed: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, vec![updated.clone()]);

    // Delete returns the removed contact
    let req = test::TestRequest::delete()
        .uri(&format!("/api/contacts/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Contact = test::read_body_json(resp).await;
    assert_eq!(deleted.id, created.id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/contacts/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_collection_accepts_trailing_slash() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "slash_user",
        "slash@example.com",
        "password123",
    )
    .await
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/contacts/")
        .insert_header(user.bearer())
        .set_json(contact_payload("Vanessa", "vanessa@example.com", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Contact = test::read_body_json(resp).await;

    let req = test::TestRequest::get()
        .uri("/api/contacts/?skip=0&limit=10")
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed: Vec<Contact> = test::read_body_json(resp).await;
    assert_eq!(listed, vec![created]);
}

#[actix_rt::test]
async fn test_contact_validation() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "validator",
        "validator@example.com",
        "password123",
    )
    .await
    .unwrap();

    let mut bad_phone = contact_payload("Wade", "wade@example.com", None);
    bad_phone["phone_number"] = json!("call me");
    let bad_email = contact_payload("Wade", "not-an-email", None);
    let empty_name = contact_payload("", "wade@example.com", None);

    for payload in [bad_phone, bad_email, empty_name] {
        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(user.bearer())
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "payload: {}",
            payload
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/contacts?skip=-1")
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::get()
        .uri("/api/contacts?limit=lots")
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_pagination() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "pager",
        "pager@example.com",
        "password123",
    )
    .await
    .unwrap();

    for i in 0..5 {
        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(user.bearer())
            .set_json(contact_payload(
                &format!("Contact{}", i),
                &format!("contact{}@example.com", i),
                None,
            ))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/contacts?skip=1&limit=2")
        .insert_header(user.bearer())
        .to_request();
    let page: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = page.iter().map(|c| c.first_name.as_str()).collect();
    assert_eq!(names, vec!["Contact1", "Contact2"]);

    // limit=0 is clamped up to one contact
    let req = test::TestRequest::get()
        .uri("/api/contacts?limit=0")
        .insert_header(user.bearer())
        .to_request();
    let page: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.len(), 1);
}

#[actix_rt::test]
async fn test_contact_ownership() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let owner = register_and_login_user(
        &app,
        &ctx.state,
        "owner",
        "owner@example.com",
        "password123",
    )
    .await
    .unwrap();
    let intruder = register_and_login_user(
        &app,
        &ctx.state,
        "intruder",
        "intruder@example.com",
        "password123",
    )
    .await
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(owner.bearer())
        .set_json(contact_payload("Vanessa", "vanessa@example.com", None))
        .to_request();
    let contact: Contact = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/contacts/{}", contact.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(intruder.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(intruder.bearer())
        .set_json(contact_payload("Hijacked", "evil@example.com", None))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(intruder.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(intruder.bearer())
        .to_request();
    let listed: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());

    // Still intact for the owner
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(owner.bearer())
        .to_request();
    let fetched: Contact = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.first_name, "Vanessa");
}

#[actix_rt::test]
async fn test_search_contacts() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "searcher",
        "searcher@example.com",
        "password123",
    )
    .await
    .unwrap();

    for (name, email) in [("Wade", "wade@example.com"), ("Vanessa", "nessa@mail.org")] {
        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(user.bearer())
            .set_json(contact_payload(name, email, None))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/contacts/search?first_name=wad")
        .insert_header(user.bearer())
        .to_request();
    let found: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].first_name, "Wade");

    // Any matching filter is enough
    let req = test::TestRequest::get()
        .uri("/api/contacts/search?first_name=nobody&email=MAIL.ORG")
        .insert_header(user.bearer())
        .to_request();
    let found: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].first_name, "Vanessa");

    let req = test::TestRequest::get()
        .uri("/api/contacts/search")
        .insert_header(user.bearer())
        .to_request();
    let found: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found.len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/contacts/search?last_name=Stark")
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Contacts not found");

    let req = test::TestRequest::get()
        .uri("/api/contacts/search?email=ab")
        .insert_header(user.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[actix_rt::test]
async fn test_upcoming_birthdays() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(
        &app,
        &ctx.state,
        "birthdays",
        "birthdays@example.com",
        "password123",
    )
    .await
    .unwrap();

    let fixtures = [
        ("InThree", Some(birth_date_in(3))),
        ("Today", Some(birth_date_in(0))),
        ("InTwenty", Some(birth_date_in(20))),
        ("NoBirthday", None),
    ];
    for (name, birth_date) in fixtures {
        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(user.bearer())
            .set_json(contact_payload(
                name,
                &format!("{}@example.com", name.to_lowercase()),
                birth_date,
            ))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/contacts/birthdays")
        .insert_header(user.bearer())
        .to_request();
    let upcoming: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = upcoming.iter().map(|c| c.first_name.as_str()).collect();
    assert_eq!(names, vec!["Today", "InThree"]);

    let req = test::TestRequest::get()
        .uri("/api/contacts/birthdays?days=30")
        .insert_header(user.bearer())
        .to_request();
    let upcoming: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = upcoming.iter().map(|c| c.first_name.as_str()).collect();
    assert_eq!(names, vec!["Today", "InThree", "InTwenty"]);

    let req = test::TestRequest::get()
        .uri("/api/contacts/birthdays?days=0")
        .insert_header(user.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}
