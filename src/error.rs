//! Error types for Portico
//!
//! All errors in the application are converted to `AppError`. Handlers
//! return `Result<_, AppError>`; the `error_pages` middleware is the
//! outermost recovery boundary and maps 404/5xx responses to the
//! templated error pages.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::AppState;

/// Application-wide error type
///
/// Per the error taxonomy, only two HTTP outcomes exist: `NotFound`
/// becomes 404 and every other variant becomes 500. No error is retried
/// or classified further.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template loading or rendering error (500)
    #[error("Template error: {0}")]
    Template(String),

    /// Provider discovery, authorization, or token exchange error (500)
    #[error("OIDC error: {0}")]
    Oidc(String),

    /// HTTP client error (500)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Session cookie encoding error (500)
    #[error("Session error: {0}")]
    Session(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Error detail carried in response extensions for the debug page
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for AppError {
    /// Convert error to a bare status-coded response
    ///
    /// The body is left empty here; `error_pages` fills in the templated
    /// page (or the diagnostic page in debug mode) from the detail stored
    /// in the response extensions.
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorDetail(self.to_string()));
        response
    }
}

/// Outermost error-page mapping layer
///
/// Rewrites 404 responses with the `404` template and 5xx responses with
/// the `500` template. In debug mode 5xx responses become a diagnostic
/// page showing the error detail instead.
pub async fn error_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return render_error_page(&state, "404", StatusCode::NOT_FOUND);
    }

    if status.is_server_error() {
        if state.config.debug {
            return debug_page(status, &response);
        }
        return render_error_page(&state, "500", status);
    }

    response
}

fn render_error_page(state: &AppState, template: &str, status: StatusCode) -> Response {
    match state.templates.render(template, &serde_json::json!({})) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(error) => {
            // The error path must not itself error; fall back to the bare
            // status code.
            tracing::error!(%error, template, "failed to render error page");
            status.into_response()
        }
    }
}

fn debug_page(status: StatusCode, response: &Response) -> Response {
    let detail = response
        .extensions()
        .get::<ErrorDetail>()
        .map(|detail| detail.0.clone())
        .unwrap_or_else(|| status.to_string());

    let body = format!(
        "<!DOCTYPE html>\n<html><head><title>{status}</title></head>\n\
         <body><h1>{status}</h1><pre>{}</pre></body></html>",
        html_escape::encode_text(&detail)
    );

    (status, Html(body)).into_response()
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
