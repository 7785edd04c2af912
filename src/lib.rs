//! Portico - a minimal web application with OpenID Connect sign-in
//!
//! A thin composition over axum: six GET routes, a signed session cookie
//! holding the provider-asserted identity claims, handlebars templates,
//! and static file serving. All state lives in the session cookie; the
//! process itself only carries immutable startup configuration.
//!
//! # Modules
//!
//! - `pages`: the session-gated templated pages
//! - `auth`: session cookie signing and the OIDC login flow
//! - `templates`: handlebars registry
//! - `config`: configuration management
//! - `error`: error types and the outermost error-page mapping

pub mod auth;
pub mod config;
pub mod error;
pub mod pages;
pub mod templates;

use std::sync::Arc;

use axum::extract::{Host, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};

/// Application state shared across all handlers
///
/// Constructed once at startup and cloned per request; every field is
/// immutable after construction.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Compiled template registry
    pub templates: Arc<templates::Templates>,

    /// Registered identity provider
    pub oauth: Arc<auth::OidcProvider>,
}

impl AppState {
    /// Initialize application state
    ///
    /// Loads and compiles the templates and registers the OIDC provider.
    /// Provider discovery itself is deferred until the first `/login`.
    ///
    /// # Errors
    /// Returns error if a template is missing or the HTTP client cannot
    /// be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let templates = templates::Templates::load(&config.templates)?;

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("Portico/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let oauth = auth::OidcProvider::new(&config, http_client);

        Ok(Self {
            config: Arc::new(config),
            templates: Arc::new(templates),
            oauth: Arc::new(oauth),
        })
    }
}

/// Build the axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

    let static_dir = state.config.static_dir.clone();

    axum::Router::new()
        .merge(pages::pages_router())
        .merge(auth::auth_router())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::error_pages,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_allowed_hosts,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject requests whose Host header is not in `ALLOWED_HOSTS`
///
/// Inactive when the allow-list is empty.
async fn enforce_allowed_hosts(
    State(state): State<AppState>,
    Host(host): Host,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.host_allowed(&host) {
        tracing::warn!(%host, "rejected request for disallowed host");
        return (StatusCode::BAD_REQUEST, "Invalid host header").into_response();
    }

    next.run(request).await
}
