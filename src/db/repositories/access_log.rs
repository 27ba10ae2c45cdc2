use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::entities::access_logs;

/// Closed vocabulary of audited actions. The stored string forms are data,
/// not display text, and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    Login,
    LoginFailed,
    Logout,
    PasswordReset,
}

impl AccessAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::LoginFailed => "falha_login",
            Self::Logout => "logout",
            Self::PasswordReset => "reset_senha",
        }
    }
}

pub struct AccessLogRepository {
    conn: DatabaseConnection,
}

impl AccessLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Append one immutable entry. `user_id` is `None` when the event could
    /// not be tied to an account.
    pub async fn record(
        &self,
        action: AccessAction,
        user_id: Option<i32>,
        ip: &str,
    ) -> Result<()> {
        access_logs::ActiveModel {
            user_id: Set(user_id),
            ip: Set(ip.to_string()),
            action: Set(action.as_str().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to append access log entry")?;

        Ok(())
    }

    /// All entries in insertion order.
    pub async fn list(&self) -> Result<Vec<access_logs::Model>> {
        access_logs::Entity::find()
            .order_by_asc(access_logs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list access log entries")
    }
}
