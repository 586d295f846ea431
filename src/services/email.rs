use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::error::AppError;

/// A plain-text e-mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers e-mail messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError>;
}

/// Writes every message to the application log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        log::info!(
            "Email from {} to {} | {}\n{}",
            message.from,
            message.to,
            message.subject,
            message.body
        );
        Ok(())
    }
}

/// Builds and sends the e-mail address confirmation message.
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
    public_base_url: String,
    from: String,
}

impl EmailService {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        tokens: TokenService,
        public_base_url: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            tokens,
            public_base_url: public_base_url.into(),
            from: from.into(),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// The link a user follows to confirm `email`.
    pub fn confirmation_link(&self, email: &str) -> Result<String, AppError> {
        let token = self.tokens.generate_email_token(email)?;
        Ok(format!(
            "{}/api/auth/confirmed_email/{}",
            self.public_base_url, token
        ))
    }

    pub fn confirmation_message(&self, email: &str, username: &str) -> Result<EmailMessage, AppError> {
        let link = self.confirmation_link(email)?;
        Ok(EmailMessage {
            from: self.from.clone(),
            to: email.to_string(),
            subject: "Confirm your email".to_string(),
            body: format!(
                "Hi {},\n\nPlease confirm your email address by following this link:\n\n{}\n\n\
                 The link is valid for 7 days.",
                username, link
            ),
        })
    }

    pub async fn send_confirmation(&self, email: &str, username: &str) -> Result<(), AppError> {
        let message = self.confirmation_message(email, username)?;
        self.mailer.send(message).await
    }

    /// Sends the confirmation on a spawned task; delivery failures are logged only.
    pub fn send_confirmation_in_background(&self, email: &str, username: &str) {
        let service = self.clone();
        let email = email.to_string();
        let username = username.to_string();
        actix_web::rt::spawn(async move {
            if let Err(err) = service.send_confirmation(&email, &username).await {
                log::error!("Failed to send confirmation email to {}: {}", email, err);
            }
        });
    }
}
