//! Domain service for authentication, account lifecycle, and role-gated
//! authorization.

use thiserror::Error;

/// Errors specific to access-control operations.
///
/// `InvalidCredentials` deliberately does not distinguish an unknown email
/// from a wrong password; account-state errors are only reachable after a
/// successful password match.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Email ou senha inválidos")]
    InvalidCredentials,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Email já cadastrado")]
    EmailTaken,

    #[error("Conta desativada")]
    AccountDeactivated,

    #[error("Conta anonimizada")]
    AccountAnonymized,

    #[error("Permissão negada")]
    PermissionDenied,

    #[error("Token inválido ou expirado")]
    InvalidOrExpiredToken,

    #[error("Usuário já inativo")]
    AlreadyInactive,

    #[error("Usuário já anonimizado")]
    AlreadyAnonymized,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccessError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccessError {
    fn from(err: anyhow::Error) -> Self {
        // Repository errors keep their DbErr source; surface them as such.
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            return Self::Database(format!("{err:#}"));
        }
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for the access-control core.
#[async_trait::async_trait]
pub trait AccessService: Send + Sync {
    /// Creates an account with a freshly hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::EmailTaken`] when the email is already
    /// registered (enforced by the schema constraint, not a pre-check).
    async fn register(&self, name: &str, email: &str, password: &str)
    -> Result<i32, AccessError>;

    /// Verifies credentials and records the attempt in the access log.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidCredentials`] for an unknown email or a
    /// failed password match; [`AccessError::AccountDeactivated`] or
    /// [`AccessError::AccountAnonymized`] when the password matched but the
    /// account can no longer authenticate.
    async fn login(&self, email: &str, password: &str, origin: &str) -> Result<i32, AccessError>;

    /// Records a logout event. There is no session state to invalidate.
    async fn logout(&self, user_id: i32, origin: &str) -> Result<(), AccessError>;

    /// Soft-deactivates an account. One-way.
    async fn request_deactivation(&self, user_id: i32) -> Result<(), AccessError>;

    /// Irreversibly scrubs the account's identifying fields and scrambles
    /// its password.
    async fn anonymize(&self, user_id: i32) -> Result<(), AccessError>;

    /// Issues a reset token and hands it to the notifier for delivery.
    async fn request_password_reset(&self, email: &str) -> Result<(), AccessError>;

    /// Redeems a reset token exactly once and installs the new password.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidOrExpiredToken`] for an unknown,
    /// already-consumed, or expired token.
    async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        origin: &str,
    ) -> Result<(), AccessError>;

    /// Assigns a role, creating it on first reference. Idempotent.
    async fn assign_role(&self, user_id: i32, role_name: &str) -> Result<(), AccessError>;

    /// Checks that the user holds at least one of the required roles.
    async fn authorize(&self, user_id: i32, required_roles: &[String])
    -> Result<(), AccessError>;
}
