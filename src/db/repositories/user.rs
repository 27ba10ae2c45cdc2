use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::users;

/// User data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<Utc>,
    pub deleted_at: Option<chrono::DateTime<Utc>>,
    pub active: bool,
    pub anonymized: bool,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
            deleted_at: model.deleted_at,
            active: model.active,
            anonymized: model.anonymized,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a user in the active, non-anonymized state.
    ///
    /// Email uniqueness is enforced by the schema constraint; a duplicate
    /// insert surfaces as a unique-violation `DbErr` for the caller to map.
    pub async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let user = users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now()),
            deleted_at: Set(None),
            active: Set(true),
            anonymized: Set(false),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(User::from(user))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by email with password hash (for credential verification)
    pub async fn get_by_email_with_hash(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Install a new password hash on a user.
    pub async fn install_password_hash(&self, user_id: i32, password_hash: &str) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Soft-deactivate a user and stamp the deactivation time.
    pub async fn deactivate(&self, user_id: i32) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for deactivation")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.active = Set(false);
        active.deleted_at = Set(Some(Utc::now()));
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Overwrite identifying fields with placeholders and flag the row.
    ///
    /// The caller supplies the placeholder name, the generated placeholder
    /// email, and a hash of a scrambled secret that is never retained.
    pub async fn anonymize(
        &self,
        user_id: i32,
        placeholder_name: &str,
        placeholder_email: &str,
        scrambled_hash: &str,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for anonymization")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.name = Set(placeholder_name.to_string());
        active.email = Set(placeholder_email.to_string());
        active.password_hash = Set(scrambled_hash.to_string());
        active.anonymized = Set(true);
        active.update(&self.conn).await?;

        Ok(())
    }
}
