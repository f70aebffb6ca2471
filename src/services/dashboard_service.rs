//! Read-only dashboard aggregates: bug/project counters, recent activity
//! and the status/priority distributions the frontend charts.

use serde::Serialize;
use thiserror::Error;

use crate::db::{BugRow, PriorityCount, StatusCount};
use crate::services::auth_service::CurrentUser;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for DashboardError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_bugs: u64,
    pub open_bugs: u64,
    pub in_progress_bugs: u64,
    pub resolved_bugs: u64,
    pub critical_bugs: u64,
    pub total_projects: u64,
}

#[derive(Debug, Serialize)]
pub struct ChartData {
    pub status_distribution: Vec<StatusCount>,
    pub priority_distribution: Vec<PriorityCount>,
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub recent_bugs: Vec<BugRow>,
    pub my_bugs: Vec<BugRow>,
    pub charts: ChartData,
}

/// Domain service trait for the dashboard.
#[async_trait::async_trait]
pub trait DashboardService: Send + Sync {
    async fn overview(&self, caller: &CurrentUser) -> Result<DashboardData, DashboardError>;
}
