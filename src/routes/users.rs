use crate::{
    auth::{AdminUser, CurrentUser},
    error::AppError,
    services::avatar_public_id,
    state::AppState,
};
use actix_web::{http::header, patch, web, HttpRequest, HttpResponse, Responder};

/// The authenticated user's profile. Mounted as a resource so it can carry
/// its own rate limit.
pub async fn me(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(user.0))
}

/// Replaces the administrator's avatar with the image sent as the raw request
/// body.
///
/// ## Responses:
/// - `200 OK`: the updated user.
/// - `403 Forbidden`: the caller is not an administrator.
/// - `413 Payload Too Large`: image over the configured payload limit.
/// - `422 Unprocessable Entity`: empty body or a non-image content type.
#[patch("/avatar")]
pub async fn update_avatar(
    state: web::Data<AppState>,
    admin: AdminUser,
    req: HttpRequest,
    image: web::Bytes,
) -> Result<impl Responder, AppError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("image/") {
        return Err(AppError::ValidationError(
            "Avatar must be sent with an image/* content type".into(),
        ));
    }
    if image.is_empty() {
        return Err(AppError::ValidationError("Avatar image is empty".into()));
    }

    let store = state.avatars.as_ref().ok_or_else(|| {
        AppError::InternalServerError("Avatar storage not configured".into())
    })?;

    let AdminUser(user) = admin;
    let url = store
        .upload(image, &content_type, &avatar_public_id(&user.username))
        .await?;
    let user = state.users.update_avatar_url(user.id, &url).await?;

    Ok(HttpResponse::Ok().json(user))
}
