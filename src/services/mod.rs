pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, CurrentUser, Registration, UserView};
pub use auth_service_impl::SeaOrmAuthService;

pub mod bug_service;
pub mod bug_service_impl;
pub use bug_service::{ALLOWED_STATUSES, BugError, BugListing, BugService, CreateBug};
pub use bug_service_impl::SeaOrmBugService;

pub mod project_service;
pub mod project_service_impl;
pub use project_service::{CreateProject, ProjectError, ProjectService};
pub use project_service_impl::SeaOrmProjectService;

pub mod dashboard_service;
pub mod dashboard_service_impl;
pub use dashboard_service::{
    ChartData, DashboardData, DashboardError, DashboardService, DashboardStats,
};
pub use dashboard_service_impl::SeaOrmDashboardService;
