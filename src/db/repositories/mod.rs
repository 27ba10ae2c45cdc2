pub mod access_log;
pub mod reset_token;
pub mod role;
pub mod user;
