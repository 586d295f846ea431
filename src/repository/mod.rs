//! Data access layer.
//!
//! Each repository is a trait so the services and handlers can run against
//! PostgreSQL in production and against the in-memory implementations in tests.
//! All contact operations take the owner's id and never return another user's rows.

pub mod contacts;
pub mod memory;
pub mod users;

pub use contacts::{ContactRepository, PgContactRepository};
pub use memory::{InMemoryContactRepository, InMemoryUserRepository};
pub use users::{PgUserRepository, UserRepository};

/// Escapes `%`, `_` and `\` so user input is matched literally inside an
/// `ILIKE` pattern, then wraps it for a substring match.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
