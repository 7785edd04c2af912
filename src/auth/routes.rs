//! Login flow routes
//!
//! Implements the authorization-code round trip with the provider:
//!
//! - GET /login  - redirect to the provider's consent page
//! - GET /auth   - OAuth callback; establishes the session
//! - GET /logout - drop the signed-in user

use axum::{
    Router,
    extract::{Host, Query, State},
    response::Redirect,
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::oidc::generate_state;
use super::session::{session_from_jar, store_session};
use crate::AppState;
use crate::config::AppConfig;
use crate::error::AppError;

/// Create authentication router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/auth", get(auth_callback))
        .route("/logout", get(logout))
}

/// Absolute URL the provider redirects back to
///
/// `PUBLIC_URL` wins when configured; otherwise the URL is derived from
/// the request's Host header.
fn callback_url(config: &AppConfig, host: &str) -> String {
    match &config.public_url {
        Some(base) => format!("{}/auth", base.trim_end_matches('/')),
        None => format!("http://{host}/auth"),
    }
}

/// GET /login
///
/// Generates a state nonce, stows it in the session, and redirects to the
/// provider's authorization endpoint.
async fn login(
    State(state): State<AppState>,
    Host(host): Host,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let nonce = generate_state();
    let redirect_uri = callback_url(&state.config, &host);
    let url = state.oauth.authorize_url(&redirect_uri, &nonce).await?;

    let mut session = session_from_jar(&jar, &state.config.secret_key);
    session.oauth_state = Some(nonce);
    let jar = store_session(jar, &session, &state.config.secret_key)?;

    tracing::debug!(%redirect_uri, "redirecting to provider");
    Ok((jar, Redirect::to(url.as_str())))
}

/// Query parameters on the provider's callback redirect
#[derive(Debug, Deserialize)]
struct AuthCallbackQuery {
    code: String,
    #[serde(default)]
    state: Option<String>,
}

/// GET /auth
///
/// Verifies the state nonce against the session, exchanges the
/// authorization code for tokens, and stores the ID-token claims as the
/// signed-in user.
async fn auth_callback(
    State(state): State<AppState>,
    Host(host): Host,
    Query(query): Query<AuthCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let mut session = session_from_jar(&jar, &state.config.secret_key);

    let expected = session
        .oauth_state
        .take()
        .ok_or_else(|| AppError::Oidc("callback without a login in progress".to_string()))?;
    if query.state.as_deref() != Some(expected.as_str()) {
        return Err(AppError::Oidc("state mismatch in callback".to_string()));
    }

    let redirect_uri = callback_url(&state.config, &host);
    let token = state.oauth.exchange_code(&query.code, &redirect_uri).await?;
    let claims = token.identity_claims()?;

    tracing::info!(email = ?claims.email, "user signed in");

    session.user = Some(claims);
    let jar = store_session(jar, &session, &state.config.secret_key)?;

    Ok((jar, Redirect::to("/admin")))
}

/// GET /logout
///
/// Removes the user from the session. A no-op for anonymous sessions.
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let mut session = session_from_jar(&jar, &state.config.secret_key);
    session.user = None;
    let jar = store_session(jar, &session, &state.config.secret_key)?;

    Ok((jar, Redirect::to("/admin")))
}
