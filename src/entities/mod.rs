pub mod prelude;

pub mod access_logs;
pub mod reset_tokens;
pub mod roles;
pub mod user_roles;
pub mod users;
