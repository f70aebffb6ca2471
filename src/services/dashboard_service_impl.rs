//! `SeaORM` implementation of the `DashboardService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::services::auth_service::CurrentUser;
use crate::services::dashboard_service::{
    ChartData, DashboardData, DashboardError, DashboardService, DashboardStats,
};

/// How many rows the recent/personal lists carry
const RECENT_LIMIT: u64 = 10;

pub struct SeaOrmDashboardService {
    store: Store,
}

impl SeaOrmDashboardService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DashboardService for SeaOrmDashboardService {
    async fn overview(&self, caller: &CurrentUser) -> Result<DashboardData, DashboardError> {
        let stats = DashboardStats {
            total_bugs: self.store.count_bugs().await?,
            open_bugs: self.store.count_bugs_by_status("open").await?,
            in_progress_bugs: self.store.count_bugs_by_status("in-progress").await?,
            resolved_bugs: self.store.count_bugs_by_status("closed").await?,
            critical_bugs: self.store.count_open_critical_bugs().await?,
            total_projects: self.store.count_active_projects().await?,
        };

        let recent_bugs = self.store.recent_bugs(RECENT_LIMIT).await?;

        // The personal queue is only computed for non-admin callers
        let my_bugs = if caller.is_admin() {
            Vec::new()
        } else {
            self.store.bugs_assigned_to(caller.id, RECENT_LIMIT).await?
        };

        let charts = ChartData {
            status_distribution: self.store.bug_status_distribution().await?,
            priority_distribution: self.store.bug_priority_distribution().await?,
        };

        Ok(DashboardData {
            stats,
            recent_bugs,
            my_bugs,
            charts,
        })
    }
}
