#![doc = "The `contactbook` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, repositories, services, routing configuration"]
#![doc = "and error handling for the Contactbook API. The binary (`main.rs`) wires them"]
#![doc = "to PostgreSQL and runs the server; integration tests wire them to the"]
#![doc = "in-memory repositories instead."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use crate::error::AppError;
pub use crate::state::AppState;
