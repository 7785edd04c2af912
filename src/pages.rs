//! Templated pages
//!
//! The session-gated pages plus the deliberate-failure route used to
//! exercise the 500 handler.

use axum::{Router, extract::State, response::Html, routing::get};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::auth::session::session_from_jar;
use crate::error::AppError;

/// Create pages router
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/admin", get(admin))
        .route("/error", get(error_example))
}

/// The `user` template variable: the session claims as JSON text, or the
/// literal `null` for anonymous visitors.
fn user_context(state: &AppState, jar: &CookieJar) -> Result<serde_json::Value, AppError> {
    let session = session_from_jar(jar, &state.config.secret_key);
    let user = serde_json::to_string(&session.user)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(serde_json::json!({ "user": user }))
}

/// GET /
async fn home(State(state): State<AppState>, jar: CookieJar) -> Result<Html<String>, AppError> {
    let context = user_context(&state, &jar)?;
    state.templates.html("no", &context)
}

/// GET /admin
async fn admin(State(state): State<AppState>, jar: CookieJar) -> Result<Html<String>, AppError> {
    let context = user_context(&state, &jar)?;
    state.templates.html("index", &context)
}

/// GET /error
///
/// Fails unconditionally. Flip the `DEBUG` setting to see either the
/// diagnostic page or the 500 template.
async fn error_example(State(_state): State<AppState>) -> Result<Html<String>, AppError> {
    Err(AppError::Internal(anyhow::anyhow!("Oh no")))
}
