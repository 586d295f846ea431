use crate::{
    auth::{LoginRequest, MessageResponse, RegisterRequest, RequestEmail, TokenResponse},
    error::AppError,
    services::Confirmation,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates an unconfirmed account and mails the confirmation link in the
/// background.
///
/// ## Responses:
/// - `201 Created`: the new user.
/// - `409 Conflict`: e-mail or username already taken.
/// - `422 Unprocessable Entity`: invalid username, e-mail or password.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = state.users.register(&register_data).await?;
    state
        .email
        .send_confirmation_in_background(&user.email, &user.username);

    Ok(HttpResponse::Created().json(user))
}

/// Login user
///
/// Exchanges username and password for a bearer access token. The e-mail
/// address must have been confirmed.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = state
        .users
        .authenticate(&login_data.username, &login_data.password)
        .await?;
    let token = state.tokens.generate_access_token(user.id)?;

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

/// Confirms the e-mail address carried by a link from the confirmation e-mail.
#[get("/confirmed_email/{token}")]
pub async fn confirmed_email(
    state: web::Data<AppState>,
    token: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let email = state.tokens.verify_email_token(&token)?;

    let message = match state.users.confirm_email(&email).await? {
        Confirmation::AlreadyConfirmed => "Your email is already confirmed",
        Confirmation::Confirmed => "Email confirmed",
    };
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

/// Re-sends the confirmation e-mail.
///
/// Unknown addresses get the same answer as known ones.
#[post("/request_email")]
pub async fn request_email(
    state: web::Data<AppState>,
    body: web::Json<RequestEmail>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    if let Some(user) = state.users.get_by_email(&body.email).await? {
        if user.confirmed {
            return Ok(
                HttpResponse::Ok().json(MessageResponse::new("Your email is already confirmed"))
            );
        }
        state
            .email
            .send_confirmation_in_background(&user.email, &user.username);
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Check your email for confirmation",
    )))
}
