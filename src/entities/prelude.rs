pub use super::access_logs::Entity as AccessLogs;
pub use super::reset_tokens::Entity as ResetTokens;
pub use super::roles::Entity as Roles;
pub use super::user_roles::Entity as UserRoles;
pub use super::users::Entity as Users;
