//! Business logic between the HTTP handlers and the repositories.

pub mod contacts;
pub mod email;
pub mod upload;
pub mod users;

pub use contacts::ContactService;
pub use email::{EmailMessage, EmailService, LogMailer, Mailer};
pub use upload::{avatar_public_id, AvatarStore, CloudinaryStore};
pub use users::{Confirmation, UserService};
