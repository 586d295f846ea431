pub mod auth;
pub mod contacts;
pub mod health;
pub mod users;

use crate::auth::AuthMiddleware;
use crate::error::{json_error_handler, query_error_handler};
use crate::rate_limit::{RateLimit, USERS_ME};
use actix_web::web;

/// Largest accepted request body; bounds avatar uploads.
pub const MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Mounts the `/auth`, `/contacts` and `/users` scopes. Expected under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::confirmed_email)
            .service(auth::request_email),
    )
    .service(
        // Literal paths before `/{id}`.
        web::scope("/contacts")
            .wrap(AuthMiddleware)
            .service(contacts::get_contacts)
            .service(contacts::get_birthdays)
            .service(contacts::search_contacts)
            .service(contacts::create_contact)
            .service(contacts::get_contact)
            .service(contacts::update_contact)
            .service(contacts::delete_contact),
    )
    .service(
        web::scope("/users")
            .wrap(AuthMiddleware)
            .service(
                web::resource("/me")
                    .wrap(RateLimit::new(USERS_ME))
                    .route(web::get().to(users::me)),
            )
            .service(users::update_avatar),
    );
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}

pub fn payload_config() -> web::PayloadConfig {
    web::PayloadConfig::new(MAX_PAYLOAD_BYTES)
}
