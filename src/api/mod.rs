use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod bugs;
mod dashboard;
mod error;
mod observability;
mod projects;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use crate::services::{AuthService, BugService, DashboardService, ProjectService};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn bugs(&self) -> &Arc<dyn BugService> {
        &self.shared.bug_service
    }

    #[must_use]
    pub fn projects(&self) -> &Arc<dyn ProjectService> {
        &self.shared.project_service
    }

    #[must_use]
    pub fn dashboard(&self) -> &Arc<dyn DashboardService> {
        &self.shared.dashboard_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_ttl_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_ttl_minutes,
        )
    };

    let protected_routes = create_protected_router();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_ttl_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth", post(auth::auth_actions))
        .route("/auth", get(auth::get_current_user))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bugs", get(bugs::list_bugs))
        .route("/bugs", post(bugs::create_bug))
        .route("/bugs", put(bugs::update_bug))
        .route("/bugs", delete(bugs::delete_bug))
        .route("/bugs/status", post(bugs::update_bug_status))
        .route("/projects", get(projects::list_projects))
        .route("/projects", post(projects::create_project))
        .route("/projects", put(projects::update_project))
        .route("/projects", delete(projects::delete_project))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::auth_middleware))
}
