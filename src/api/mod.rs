use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::constants::UNKNOWN_ORIGIN;
use crate::db::Store;
use crate::notify::{NoopMailer, ResetNotifier, WebhookMailer};
use crate::services::{AccessService, SeaOrmAccessService};

mod accounts;
mod auth;
mod error;
mod recovery;
mod roles;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub access: Arc<dyn AccessService>,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let notifier: Arc<dyn ResetNotifier> = if config.mailer.enabled {
        Arc::new(WebhookMailer::new(&config.mailer)?)
    } else {
        Arc::new(NoopMailer)
    };

    let access = Arc::new(SeaOrmAccessService::new(
        store.clone(),
        notifier,
        config.security.clone(),
    ));

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        store,
        access,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/accounts/register", post(accounts::register))
        .route("/accounts/deactivate", post(accounts::deactivate))
        .route("/accounts/anonymize", post(accounts::anonymize))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/roles/assign", post(roles::assign))
        .route("/roles/authorize", post(roles::authorize))
        .route("/admin/area", get(roles::admin_area))
        .route("/recovery/request", post(recovery::request_reset))
        .route("/recovery/confirm", post(recovery::confirm_reset))
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Client network origin for the access log: first forwarded address, then
/// the reverse-proxy header, then the fixed placeholder.
pub(crate) fn client_origin(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map_or_else(|| UNKNOWN_ORIGIN.to_string(), ToString::to_string)
}
