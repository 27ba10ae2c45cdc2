pub mod access_service;
pub mod access_service_impl;

pub use access_service::{AccessError, AccessService};
pub use access_service_impl::SeaOrmAccessService;
