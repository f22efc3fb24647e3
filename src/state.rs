use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::flows::repo::{FlowRepo, PgFlowRepo};
use crate::mail::{DisabledMailer, Mailer, SmtpMailer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub flows: Arc<dyn FlowRepo>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Wires the Postgres repositories and the configured mailer around an
    /// already opened pool. The caller owns the pool's lifecycle.
    pub fn postgres(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, port = smtp.port, "smtp mailer configured");
                Arc::new(SmtpMailer::new(smtp, &config.frontend_url)?)
            }
            None => {
                if config.email_verification.is_required() {
                    warn!("email verification is required but SMTP_HOST is not set; verification emails will not be delivered");
                }
                Arc::new(DisabledMailer)
            }
        };

        Ok(Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgFlowRepo::new(db)),
            mailer,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        flows: Arc<dyn FlowRepo>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            users,
            flows,
            mailer,
        }
    }
}
