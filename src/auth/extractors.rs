use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::{User, UserRole};
use crate::state::AppState;

/// The authenticated user's id, taken from the claims `AuthMiddleware` stored
/// in the request extensions. Does not touch the database.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUserId(pub i32);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthenticatedUserId(claims.sub))),
            None => {
                let err = AppError::Unauthorized(
                    "User ID not found in request. Ensure AuthMiddleware is active.".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}

/// The full account record of the authenticated user.
///
/// Fails with 401 when the token's subject no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let claims = claims.ok_or_else(|| {
                AppError::Unauthorized("Could not validate credentials".into())
            })?;
            let state = state.ok_or_else(|| {
                AppError::InternalServerError("Application state not configured".into())
            })?;

            let user = state
                .users
                .get_by_id(claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".into()))?;
            Ok(CurrentUser(user))
        })
    }
}

/// Like [`CurrentUser`], but additionally requires the `admin` role (403 otherwise).
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let current = CurrentUser::from_request(req, payload);
        Box::pin(async move {
            let CurrentUser(user) = current.await?;
            if user.role != UserRole::Admin {
                return Err(AppError::Forbidden("Insufficient permissions".into()).into());
            }
            Ok(AdminUser(user))
        })
    }
}
