//! `SeaORM` implementation of the `AccessService` trait.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DbErr, SqlErr};
use std::sync::Arc;
use tokio::task;
use tracing::warn;

use crate::auth;
use crate::config::SecurityConfig;
use crate::constants::anonymization::{
    PLACEHOLDER_EMAIL_DOMAIN, PLACEHOLDER_EMAIL_TAG_LEN, PLACEHOLDER_NAME,
};
use crate::db::{AccessAction, Store};
use crate::notify::ResetNotifier;
use crate::services::access_service::{AccessError, AccessService};

pub struct SeaOrmAccessService {
    store: Store,
    notifier: Arc<dyn ResetNotifier>,
    security: SecurityConfig,
}

impl SeaOrmAccessService {
    #[must_use]
    pub fn new(store: Store, notifier: Arc<dyn ResetNotifier>, security: SecurityConfig) -> Self {
        Self {
            store,
            notifier,
            security,
        }
    }

    /// Argon2 hashing is CPU-intensive and would block the async runtime
    /// if run directly.
    async fn hash_blocking(&self, password: &str) -> Result<String, AccessError> {
        let password = password.to_string();
        let config = self.security.clone();

        task::spawn_blocking(move || auth::hash_password(&password, Some(&config)))
            .await
            .map_err(|e| AccessError::Internal(format!("Password hashing task panicked: {e}")))?
            .map_err(AccessError::from)
    }

    async fn verify_blocking(&self, password: &str, digest: &str) -> Result<bool, AccessError> {
        let password = password.to_string();
        let digest = digest.to_string();

        task::spawn_blocking(move || auth::verify_password(&password, &digest))
            .await
            .map_err(|e| {
                AccessError::Internal(format!("Password verification task panicked: {e}"))
            })
    }

    /// Best-effort audit append. A failed write is logged and never fails
    /// the primary operation.
    async fn audit(&self, action: AccessAction, user_id: Option<i32>, origin: &str) {
        if let Err(e) = self.store.record_access(action, user_id, origin).await {
            warn!(
                "Failed to record '{}' access log entry: {e:#}",
                action.as_str()
            );
        }
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|sql_err| matches!(sql_err, SqlErr::UniqueConstraintViolation(_)))
}

fn placeholder_email() -> String {
    let mut tag = uuid::Uuid::new_v4().simple().to_string();
    tag.truncate(PLACEHOLDER_EMAIL_TAG_LEN);
    format!("anonimo-{tag}@{PLACEHOLDER_EMAIL_DOMAIN}")
}

#[async_trait]
impl AccessService for SeaOrmAccessService {
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i32, AccessError> {
        let password_hash = self.hash_blocking(password).await?;

        match self.store.create_user(name, email, &password_hash).await {
            Ok(user) => Ok(user.id),
            Err(e) if is_unique_violation(&e) => Err(AccessError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn login(&self, email: &str, password: &str, origin: &str) -> Result<i32, AccessError> {
        let Some((user, password_hash)) = self.store.get_user_by_email_with_hash(email).await?
        else {
            self.audit(AccessAction::LoginFailed, None, origin).await;
            return Err(AccessError::InvalidCredentials);
        };

        if !self.verify_blocking(password, &password_hash).await? {
            self.audit(AccessAction::LoginFailed, None, origin).await;
            return Err(AccessError::InvalidCredentials);
        }

        // Account-state checks come after the password match; a correct
        // password on a closed account reveals the account state.
        if !user.active {
            return Err(AccessError::AccountDeactivated);
        }

        if user.anonymized {
            return Err(AccessError::AccountAnonymized);
        }

        self.audit(AccessAction::Login, Some(user.id), origin).await;

        Ok(user.id)
    }

    async fn logout(&self, user_id: i32, origin: &str) -> Result<(), AccessError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        self.audit(AccessAction::Logout, Some(user.id), origin).await;

        Ok(())
    }

    async fn request_deactivation(&self, user_id: i32) -> Result<(), AccessError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        if !user.active {
            return Err(AccessError::AlreadyInactive);
        }

        self.store.deactivate_user(user.id).await?;

        Ok(())
    }

    async fn anonymize(&self, user_id: i32) -> Result<(), AccessError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        if user.anonymized {
            return Err(AccessError::AlreadyAnonymized);
        }

        // The scramble secret exists only long enough to be hashed.
        let scrambled_hash = self.hash_blocking(&auth::generate_scramble_secret()).await?;

        self.store
            .anonymize_user(user.id, PLACEHOLDER_NAME, &placeholder_email(), &scrambled_hash)
            .await?;

        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AccessError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        let token = auth::generate_reset_token();
        let expires_at =
            Utc::now() + chrono::Duration::minutes(self.security.reset_token_ttl_minutes);

        self.store
            .create_reset_token(user.id, &token, expires_at)
            .await?;

        // Fire-and-forget delivery: the token is already committed, so a
        // gateway failure is a delivery problem, not a state problem.
        if let Err(e) = self.notifier.deliver(&user.email, &token).await {
            warn!("Failed to deliver reset notification to {}: {e:#}", user.email);
        }

        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        origin: &str,
    ) -> Result<(), AccessError> {
        let user_id = self
            .store
            .consume_reset_token(token)
            .await?
            .ok_or(AccessError::InvalidOrExpiredToken)?;

        let password_hash = self.hash_blocking(new_password).await?;
        self.store
            .install_password_hash(user_id, &password_hash)
            .await?;

        self.audit(AccessAction::PasswordReset, Some(user_id), origin)
            .await;

        Ok(())
    }

    async fn assign_role(&self, user_id: i32, role_name: &str) -> Result<(), AccessError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        self.store.assign_role(user.id, role_name).await?;

        Ok(())
    }

    async fn authorize(
        &self,
        user_id: i32,
        required_roles: &[String],
    ) -> Result<(), AccessError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        let role_names = self.store.role_names_for_user(user.id).await?;

        if required_roles.iter().any(|r| role_names.contains(r)) {
            return Ok(());
        }

        Err(AccessError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoopMailer;

    async fn test_service() -> SeaOrmAccessService {
        let db_path = std::env::temp_dir().join(format!(
            "sentinela-service-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Store::new(&format!("sqlite:{}", db_path.display()))
            .await
            .expect("failed to open test store");

        SeaOrmAccessService::new(store, Arc::new(NoopMailer), SecurityConfig::default())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let service = test_service().await;

        service
            .register("Ana", "ana@x.com", "Secret1")
            .await
            .unwrap();

        let err = service
            .register("Outra Ana", "ana@x.com", "Secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::EmailTaken));
    }

    #[tokio::test]
    async fn test_deactivated_account_is_revealed_only_after_password_match() {
        let service = test_service().await;

        let id = service
            .register("Bia", "bia@x.com", "Secret1")
            .await
            .unwrap();
        service.request_deactivation(id).await.unwrap();

        // Wrong password on a deactivated account still reads as bad credentials.
        let err = service.login("bia@x.com", "wrong", "10.0.0.1").await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidCredentials));

        let err = service
            .login("bia@x.com", "Secret1", "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::AccountDeactivated));
    }

    #[tokio::test]
    async fn test_failed_logins_are_recorded_without_a_user_id() {
        let service = test_service().await;

        service
            .register("Caio", "caio@x.com", "Secret1")
            .await
            .unwrap();

        let _ = service.login("nobody@x.com", "Secret1", "10.0.0.1").await;
        let _ = service.login("caio@x.com", "wrong", "10.0.0.1").await;

        let failures: Vec<_> = service
            .store
            .list_access_logs()
            .await
            .unwrap()
            .into_iter()
            .filter(|entry| entry.action == AccessAction::LoginFailed.as_str())
            .collect();

        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|entry| entry.user_id.is_none()));
    }

    #[tokio::test]
    async fn test_anonymization_scrubs_identity_and_is_guarded() {
        let service = test_service().await;

        let id = service
            .register("Dora", "dora@x.com", "Secret1")
            .await
            .unwrap();
        service.anonymize(id).await.unwrap();

        let user = service.store.get_user_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.name, PLACEHOLDER_NAME);
        assert!(user.email.starts_with("anonimo-"));
        assert!(user.email.ends_with(PLACEHOLDER_EMAIL_DOMAIN));
        assert!(user.anonymized);

        let err = service.anonymize(id).await.unwrap_err();
        assert!(matches!(err, AccessError::AlreadyAnonymized));

        // The original email no longer resolves to an account.
        let err = service
            .login("dora@x.com", "Secret1", "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authorize_requires_an_intersecting_role() {
        let service = test_service().await;

        let id = service
            .register("Edu", "edu@x.com", "Secret1")
            .await
            .unwrap();

        let err = service
            .authorize(id, &["admin".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::PermissionDenied));

        service.assign_role(id, "admin").await.unwrap();
        service.assign_role(id, "admin").await.unwrap();

        service.authorize(id, &["admin".to_string()]).await.unwrap();
        service
            .authorize(id, &["auditor".to_string(), "admin".to_string()])
            .await
            .unwrap();
    }
}
