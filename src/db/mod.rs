use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::access_logs;

pub mod migrator;
pub mod repositories;

pub use repositories::access_log::AccessAction;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn role_repo(&self) -> repositories::role::RoleRepository {
        repositories::role::RoleRepository::new(self.conn.clone())
    }

    fn reset_token_repo(&self) -> repositories::reset_token::ResetTokenRepository {
        repositories::reset_token::ResetTokenRepository::new(self.conn.clone())
    }

    fn access_log_repo(&self) -> repositories::access_log::AccessLogRepository {
        repositories::access_log::AccessLogRepository::new(self.conn.clone())
    }

    pub async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        self.user_repo().create(name, email, password_hash).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_email_with_hash(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_hash(email).await
    }

    pub async fn install_password_hash(&self, user_id: i32, password_hash: &str) -> Result<()> {
        self.user_repo()
            .install_password_hash(user_id, password_hash)
            .await
    }

    pub async fn deactivate_user(&self, user_id: i32) -> Result<()> {
        self.user_repo().deactivate(user_id).await
    }

    pub async fn anonymize_user(
        &self,
        user_id: i32,
        placeholder_name: &str,
        placeholder_email: &str,
        scrambled_hash: &str,
    ) -> Result<()> {
        self.user_repo()
            .anonymize(user_id, placeholder_name, placeholder_email, scrambled_hash)
            .await
    }

    pub async fn assign_role(&self, user_id: i32, role_name: &str) -> Result<()> {
        self.role_repo().assign(user_id, role_name).await
    }

    pub async fn role_names_for_user(&self, user_id: i32) -> Result<Vec<String>> {
        self.role_repo().names_for_user(user_id).await
    }

    pub async fn create_reset_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.reset_token_repo()
            .create(user_id, token, expires_at)
            .await
    }

    pub async fn consume_reset_token(&self, token: &str) -> Result<Option<i32>> {
        self.reset_token_repo().consume(token).await
    }

    pub async fn record_access(
        &self,
        action: AccessAction,
        user_id: Option<i32>,
        ip: &str,
    ) -> Result<()> {
        self.access_log_repo().record(action, user_id, ip).await
    }

    pub async fn list_access_logs(&self) -> Result<Vec<access_logs::Model>> {
        self.access_log_repo().list().await
    }
}
