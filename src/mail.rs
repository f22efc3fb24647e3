use axum::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::config::SmtpConfig;

pub const VERIFICATION_SUBJECT: &str = "Verify Your Email Address";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail delivery is not configured")]
    NotConfigured,
    #[error("invalid address `{0}`")]
    Address(String),
    #[error("building message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Sends the account verification email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), MailError>;
}

pub fn verification_url(frontend_url: &str, token: &str) -> String {
    format!("{}/?token={}", frontend_url.trim_end_matches('/'), token)
}

pub fn verification_body(url: &str) -> String {
    format!(
        r#"
            <h1>Welcome!</h1>
            <p>Please click the link below to verify your email address:</p>
            <a href="{url}">Verify Email</a>
            <p>If you didn't create an account, please ignore this email.</p>
        "#
    )
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    frontend_url: String,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig, frontend_url: &str) -> Result<Self, MailError> {
        let builder = if cfg.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
        };
        let builder = builder.port(cfg.port);
        let builder = match (&cfg.username, &cfg.password) {
            (Some(user), Some(pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
            _ => builder,
        };

        let from = format!("\"{}\" <{}>", cfg.from_name, cfg.from_email)
            .parse::<Mailbox>()
            .map_err(|_| MailError::Address(cfg.from_email.clone()))?;

        Ok(Self {
            transport: builder.build(),
            from,
            frontend_url: frontend_url.to_string(),
        })
    }

    fn build_message(&self, to: &str, token: &str) -> Result<Message, MailError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|_| MailError::Address(to.to_string()))?;
        let url = verification_url(&self.frontend_url, token);
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(VERIFICATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(verification_body(&url))?;
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), MailError> {
        let message = self.build_message(to, token)?;
        self.transport.send(message).await?;
        debug!(to, "verification email sent");
        Ok(())
    }
}

/// Installed when no SMTP host is configured.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_verification(&self, _to: &str, _token: &str) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: Some("user".into()),
            password: Some("pass".into()),
            from_email: "noreply@example.com".into(),
            from_name: "Node Path".into(),
        }
    }

    #[test]
    fn url_joins_frontend_and_token() {
        assert_eq!(
            verification_url("https://app.example.com/", "abc"),
            "https://app.example.com/?token=abc"
        );
        assert_eq!(
            verification_url("http://localhost:51934", "abc"),
            "http://localhost:51934/?token=abc"
        );
    }

    #[test]
    fn body_links_to_url() {
        let body = verification_body("https://x.test/?token=t");
        assert!(body.contains(r#"<a href="https://x.test/?token=t">Verify Email</a>"#));
    }

    #[tokio::test]
    async fn builds_message_with_display_name() {
        let mailer = SmtpMailer::new(&smtp_config(), "https://app.example.com").unwrap();
        let message = mailer.build_message("someone@example.com", "tok123").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Verify Your Email Address"));
        assert!(raw.contains("Node Path"));
        assert!(raw.contains("noreply@example.com"));
        assert!(raw.contains("someone@example.com"));
    }

    #[tokio::test]
    async fn rejects_bad_recipient_before_sending() {
        let mailer = SmtpMailer::new(&smtp_config(), "https://app.example.com").unwrap();
        let err = mailer.send_verification("not-an-email", "tok").await.unwrap_err();
        assert!(matches!(err, MailError::Address(addr) if addr == "not-an-email"));
    }

    #[test]
    fn rejects_bad_sender() {
        let mut cfg = smtp_config();
        cfg.from_email = "nobody".into();
        assert!(matches!(
            SmtpMailer::new(&cfg, "https://app.example.com"),
            Err(MailError::Address(_))
        ));
    }

    #[tokio::test]
    async fn disabled_mailer_reports_not_configured() {
        let err = DisabledMailer.send_verification("a@b.com", "t").await.unwrap_err();
        assert!(matches!(err, MailError::NotConfigured));
    }
}
