use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{BirthdayQuery, ContactInput, ContactQuery, ContactSearch},
    services::contacts::DEFAULT_BIRTHDAY_WINDOW_DAYS,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

/// Retrieves a page of the authenticated user's contacts.
///
/// ## Query Parameters:
/// - `skip` (optional): number of contacts to skip, default 0.
/// - `limit` (optional): page size, default 10, clamped to 1..=100.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Contact` objects ordered by id.
/// - `401 Unauthorized`: missing or invalid bearer token.
/// - `422 Unprocessable Entity`: negative `skip`.
#[get("")]
pub async fn get_contacts(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    query: web::Query<ContactQuery>,
) -> Result<impl Responder, AppError> {
    let contacts = state.contacts.list(user_id.0, &query).await?;
    Ok(HttpResponse::Ok().json(contacts))
}

/// Contacts whose birthday falls within the next `days` days (default 7),
/// today included, soonest first.
#[get("/birthdays")]
pub async fn get_birthdays(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    query: web::Query<BirthdayQuery>,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    let days = query.days.unwrap_or(DEFAULT_BIRTHDAY_WINDOW_DAYS);
    let today = Utc::now().date_naive();

    let contacts = state
        .contacts
        .upcoming_birthdays(user_id.0, today, days)
        .await?;
    Ok(HttpResponse::Ok().json(contacts))
}

/// Case-insensitive search by first name, last name or e-mail.
///
/// A contact matches when any of the given filters matches. Responds 404 when
/// nothing matches.
#[get("/search")]
pub async fn search_contacts(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    filter: web::Query<ContactSearch>,
) -> Result<impl Responder, AppError> {
    let contacts = state.contacts.search(user_id.0, &filter).await?;
    Ok(HttpResponse::Ok().json(contacts))
}

/// Creates a contact owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new `Contact`.
/// - `401 Unauthorized`: missing or invalid bearer token.
/// - `422 Unprocessable Entity`: validation failed on `ContactInput`.
#[post("")]
pub async fn create_contact(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    contact_data: web::Json<ContactInput>,
) -> Result<impl Responder, AppError> {
    let contact = state.contacts.create(user_id.0, &contact_data).await?;
    Ok(HttpResponse::Created().json(contact))
}

/// Retrieves one contact. Contacts of other users are reported as not found.
#[get("/{id}")]
pub async fn get_contact(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    contact_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let contact = state.contacts.get(user_id.0, contact_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(contact))
}

/// Replaces every field of a contact the user owns.
///
/// ## Responses:
/// - `200 OK`: the updated `Contact`.
/// - `404 Not Found`: no such contact for this user.
/// - `422 Unprocessable Entity`: validation failed on `ContactInput`.
#[put("/{id}")]
pub async fn update_contact(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    contact_id: web::Path<i32>,
    contact_data: web::Json<ContactInput>,
) -> Result<impl Responder, AppError> {
    let contact = state
        .contacts
        .update(user_id.0, contact_id.into_inner(), &contact_data)
        .await?;
    Ok(HttpResponse::Ok().json(contact))
}

/// Deletes a contact the user owns and returns it.
#[delete("/{id}")]
pub async fn delete_contact(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    contact_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let contact = state
        .contacts
        .remove(user_id.0, contact_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(contact))
}
