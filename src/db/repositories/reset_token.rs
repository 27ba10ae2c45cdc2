use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::reset_tokens;

pub struct ResetTokenRepository {
    conn: DatabaseConnection,
}

impl ResetTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Store a freshly issued token. Consumed tokens from earlier requests
    /// stay in the table; only the token string itself must be unique.
    pub async fn create(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        reset_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(token.to_string()),
            expires_at: Set(expires_at),
            consumed: Set(false),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to store reset token")?;

        Ok(())
    }

    /// Atomically consume an unexpired, unconsumed token.
    ///
    /// The conditional update's affected-row count is the single-use gate:
    /// of any number of concurrent redemptions, exactly one flips the
    /// `consumed` flag and gets the owning user id back. Returns `None` when
    /// the token is unknown, already consumed, or past its expiry.
    pub async fn consume(&self, token: &str) -> Result<Option<i32>> {
        let now = Utc::now();

        let result = reset_tokens::Entity::update_many()
            .col_expr(reset_tokens::Column::Consumed, Expr::value(true))
            .filter(reset_tokens::Column::Token.eq(token))
            .filter(reset_tokens::Column::Consumed.eq(false))
            .filter(reset_tokens::Column::ExpiresAt.gt(now))
            .exec(&self.conn)
            .await
            .context("Failed to consume reset token")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let row = reset_tokens::Entity::find()
            .filter(reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to load consumed reset token")?
            .ok_or_else(|| anyhow::anyhow!("Consumed reset token vanished"))?;

        Ok(Some(row.user_id))
    }
}
