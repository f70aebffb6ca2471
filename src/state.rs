use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, BugService, DashboardService, ProjectService, SeaOrmAuthService,
    SeaOrmBugService, SeaOrmDashboardService, SeaOrmProjectService,
};

/// Everything a request handler may need, wired once at startup
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub bug_service: Arc<dyn BugService>,

    pub project_service: Arc<dyn ProjectService>,

    pub dashboard_service: Arc<dyn DashboardService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config_arc = Arc::new(RwLock::new(config));

        let auth_service: Arc<dyn AuthService> =
            Arc::new(SeaOrmAuthService::new(store.clone(), config_arc.clone()));

        let bug_service: Arc<dyn BugService> = Arc::new(SeaOrmBugService::new(store.clone()));

        let project_service: Arc<dyn ProjectService> =
            Arc::new(SeaOrmProjectService::new(store.clone()));

        let dashboard_service: Arc<dyn DashboardService> =
            Arc::new(SeaOrmDashboardService::new(store.clone()));

        Ok(Self {
            config: config_arc,
            store,
            auth_service,
            bug_service,
            project_service,
            dashboard_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
