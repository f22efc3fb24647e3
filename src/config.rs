use anyhow::Context;
use serde::Deserialize;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:51934";

/// Whether signin requires a confirmed email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationPolicy {
    /// Signup issues a token and mails it; unverified users cannot sign in.
    Required,
    /// No tokens, no mail, no check at signin.
    Disabled,
}

impl VerificationPolicy {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(Self::Required),
            "disabled" | "off" => Ok(Self::Disabled),
            other => anyhow::bail!("EMAIL_VERIFICATION must be `required` or `disabled`, got `{other}`"),
        }
    }

    pub fn is_required(self) -> bool {
        self == Self::Required
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    /// `*` without credentials instead of the allow-list.
    pub allow_any: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub smtp: Option<SmtpConfig>,
    pub frontend_url: String,
    pub email_verification: VerificationPolicy,
    pub cors: CorsConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            get("DATABASE_URL").context("Missing required environment var DATABASE_URL")?;

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw
                        .trim()
                        .parse::<u16>()
                        .with_context(|| format!("invalid SMTP_PORT `{raw}`"))?,
                    None => 587,
                };
                let username = get("SMTP_USER");
                let from_email = get("FROM_EMAIL")
                    .or_else(|| username.clone())
                    .context("FROM_EMAIL (or SMTP_USER) is required when SMTP_HOST is set")?;
                Some(SmtpConfig {
                    host,
                    port,
                    username,
                    password: get("SMTP_PASS"),
                    from_email,
                    from_name: get("MAIL_FROM_NAME").unwrap_or_else(|| "Node Path".into()),
                })
            }
            None => None,
        };

        let email_verification = match get("EMAIL_VERIFICATION") {
            Some(raw) => VerificationPolicy::parse(&raw)?,
            None => VerificationPolicy::Disabled,
        };

        let allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_FRONTEND_URL.to_string()]);
        let allow_any = get("CORS_ALLOW_ANY")
            .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        let port = match get("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid APP_PORT `{raw}`"))?,
            None => 8080,
        };

        Ok(Self {
            database_url,
            smtp,
            frontend_url: get("FE_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.into()),
            email_verification,
            cors: CorsConfig {
                allowed_origins,
                allow_any,
            },
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }
}
