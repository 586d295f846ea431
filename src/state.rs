use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::rate_limit::RateLimitStore;
use crate::repository::{
    ContactRepository, InMemoryContactRepository, InMemoryUserRepository, PgContactRepository,
    PgUserRepository, UserRepository,
};
use crate::services::{
    AvatarStore, CloudinaryStore, ContactService, EmailService, LogMailer, Mailer, UserService,
};

const MIN_BCRYPT_COST: u32 = 4;

/// Shared application state, registered once as `web::Data<AppState>` and
/// shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub contacts: ContactService,
    pub users: UserService,
    pub tokens: TokenService,
    pub email: EmailService,
    /// `None` when no avatar storage is configured.
    pub avatars: Option<Arc<dyn AvatarStore>>,
    pub rate_limits: RateLimitStore,
}

impl AppState {
    pub fn new(
        contacts: Arc<dyn ContactRepository>,
        users: Arc<dyn UserRepository>,
        tokens: TokenService,
        mailer: Arc<dyn Mailer>,
        avatars: Option<Arc<dyn AvatarStore>>,
        public_base_url: &str,
        mail_from: &str,
    ) -> Self {
        Self {
            contacts: ContactService::new(contacts),
            users: UserService::new(users),
            email: EmailService::new(mailer, tokens.clone(), public_base_url, mail_from),
            tokens,
            avatars,
            rate_limits: RateLimitStore::standard(),
        }
    }

    /// Production wiring: PostgreSQL repositories, logged e-mails and Cloudinary
    /// avatars when configured.
    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        let avatars = config
            .cloudinary
            .clone()
            .map(|c| Arc::new(CloudinaryStore::new(c)) as Arc<dyn AvatarStore>);

        Self::new(
            Arc::new(PgContactRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool)),
            TokenService::new(&config.jwt_secret, config.jwt_expiration_seconds),
            Arc::new(LogMailer),
            avatars,
            &config.public_base_url,
            &config.mail_from,
        )
    }

    /// In-memory repositories and the cheapest bcrypt cost; meant for tests.
    pub fn in_memory(jwt_secret: &str) -> Self {
        let mut state = Self::new(
            Arc::new(InMemoryContactRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            TokenService::new(jwt_secret, 3600),
            Arc::new(LogMailer),
            None,
            "http://localhost:8080",
            "noreply@contactbook.local",
        );
        state.users = state.users.with_hash_cost(MIN_BCRYPT_COST);
        state
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.email = self.email.with_mailer(mailer);
        self
    }

    pub fn with_avatar_store(mut self, store: Arc<dyn AvatarStore>) -> Self {
        self.avatars = Some(store);
        self
    }
}
