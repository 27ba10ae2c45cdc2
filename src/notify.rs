//! Out-of-band delivery of password-reset notifications.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MailerConfig;

/// Collaborator that hands a reset token to the account's registered email.
///
/// Delivery failures are the caller's to log; they never roll back the
/// already-committed token.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn deliver(&self, email: &str, token: &str) -> Result<()>;
}

/// Posts the reset notification to a mail-gateway webhook.
pub struct WebhookMailer {
    client: reqwest::Client,
    webhook_url: String,
    from_address: String,
    reset_url_base: String,
}

impl WebhookMailer {
    pub fn new(config: &MailerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.into()))
            .build()
            .context("Failed to build mailer HTTP client")?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            from_address: config.from_address.clone(),
            reset_url_base: config.reset_url_base.clone(),
        })
    }
}

#[async_trait]
impl ResetNotifier for WebhookMailer {
    async fn deliver(&self, email: &str, token: &str) -> Result<()> {
        let reset_link = format!("{}?token={}", self.reset_url_base, token);
        let payload = serde_json::json!({
            "to": email,
            "from": self.from_address,
            "subject": "Reset de Senha - Sistema de Usuários",
            "body": format!("Clique no link para resetar sua senha:\n\n{reset_link}"),
        });

        self.client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach mail gateway")?
            .error_for_status()
            .context("Mail gateway rejected the notification")?;

        info!("Reset notification dispatched to {email}");
        Ok(())
    }
}

/// Stands in when outbound mail is disabled.
pub struct NoopMailer;

#[async_trait]
impl ResetNotifier for NoopMailer {
    async fn deliver(&self, email: &str, _token: &str) -> Result<()> {
        debug!("Mailer disabled; dropping reset notification for {email}");
        Ok(())
    }
}
