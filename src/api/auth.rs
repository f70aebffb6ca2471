use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, UserPayload};
use crate::services::{CurrentUser, Registration, UserView};

/// Session key holding the authenticated identity
pub(crate) const SESSION_USER_KEY: &str = "user";

// ============================================================================
// Request Types
// ============================================================================

/// POST /auth body; the `action` field selects the operation, the rest of
/// the fields are read per action.
#[derive(Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub action: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session into a [`CurrentUser`] request extension; requests
/// without a live session are rejected with 401 before any handler runs.
pub async fn auth_middleware(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session_user(&session).await?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Get the identity from the session, or 401
async fn session_user(session: &Session) -> Result<CurrentUser, ApiError> {
    session
        .get::<CurrentUser>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth
/// Dispatches on the `action` body field: login, register or logout.
pub async fn auth_actions(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<AuthRequest>,
) -> Result<Response, ApiError> {
    match payload.action.as_str() {
        "login" => login(&state, &session, payload)
            .await
            .map(IntoResponse::into_response),
        "register" => register(&state, &session, payload)
            .await
            .map(IntoResponse::into_response),
        "logout" => Ok(logout(&session).await.into_response()),
        _ => Err(ApiError::validation("Invalid action")),
    }
}

/// Authenticate with username (or email) and password, establishing a
/// session on success.
async fn login(
    state: &AppState,
    session: &Session,
    payload: AuthRequest,
) -> Result<Json<ApiResponse<UserPayload>>, ApiError> {
    let identifier = payload.username.as_deref().unwrap_or("").trim();
    let password = payload.password.as_deref().unwrap_or("");

    if identifier.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let user = state.auth().login(identifier, password).await?;

    store_session_user(session, &user).await?;

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        UserPayload {
            user: UserView::from(user),
        },
    )))
}

/// Create an account; registration implies login.
async fn register(
    state: &AppState,
    session: &Session,
    payload: AuthRequest,
) -> Result<Json<ApiResponse<UserPayload>>, ApiError> {
    let registration = Registration {
        username: payload.username.unwrap_or_default().trim().to_string(),
        email: payload.email.unwrap_or_default().trim().to_string(),
        password: payload.password.unwrap_or_default(),
        confirm_password: payload.confirm_password.unwrap_or_default(),
    };

    let user = state.auth().register(registration).await?;

    store_session_user(session, &user).await?;

    Ok(Json(ApiResponse::with_message(
        "Registration successful",
        UserPayload {
            user: UserView::from(user),
        },
    )))
}

/// Destroy the session. Succeeds whether or not one existed.
async fn logout(session: &Session) -> Json<ApiResponse<()>> {
    let _ = session.flush().await;
    Json(ApiResponse::message("Logout successful"))
}

/// GET /auth
/// Current user, re-read from the database rather than echoed from the
/// session.
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserPayload>>, ApiError> {
    let identity = session
        .get::<CurrentUser>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user = state.auth().current_user(identity.id).await?;

    Ok(Json(ApiResponse::success(UserPayload { user })))
}

async fn store_session_user(session: &Session, user: &CurrentUser) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}
