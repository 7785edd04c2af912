//! OIDC provider client
//!
//! Implements the pieces of the OpenID Connect authorization-code flow the
//! routes consume: provider discovery, authorization-redirect URL
//! construction, code-for-token exchange, and identity-claim extraction
//! from the ID token.
//!
//! The ID token's signature is deliberately not validated; the claims are
//! read straight from its payload segment.

use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use super::session::UserClaims;
use crate::config::AppConfig;
use crate::error::{AppError, Result};

/// Scopes requested from the provider
pub const SCOPES: &str = "openid email profile";

/// Provider discovery document (the fields we consume)
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

impl ProviderMetadata {
    /// Fetch the discovery document from the well-known URL
    pub async fn discover(client: &reqwest::Client, metadata_url: &str) -> Result<Self> {
        let response = client.get(metadata_url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Oidc(format!(
                "discovery request failed with status {}",
                response.status()
            )));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| AppError::Oidc(format!("invalid discovery document: {e}")))?;

        if metadata.authorization_endpoint.is_empty() || metadata.token_endpoint.is_empty() {
            return Err(AppError::Oidc(
                "discovery document missing authorization or token endpoint".to_string(),
            ));
        }

        Ok(metadata)
    }
}

/// Token response from the provider's token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Extract identity claims from the ID token
    ///
    /// The token's payload segment is base64url-decoded and parsed as
    /// JSON; no signature validation is performed.
    pub fn identity_claims(&self) -> Result<UserClaims> {
        use base64::{Engine as _, engine::general_purpose};

        let id_token = self
            .id_token
            .as_deref()
            .ok_or_else(|| AppError::Oidc("token response had no id_token".to_string()))?;

        let mut segments = id_token.split('.');
        let payload_b64 = match (segments.next(), segments.next()) {
            (Some(_header), Some(payload)) => payload,
            _ => return Err(AppError::Oidc("id_token is not a JWT".to_string())),
        };

        let payload = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| AppError::Oidc(format!("undecodable id_token payload: {e}")))?;

        serde_json::from_slice(&payload)
            .map_err(|e| AppError::Oidc(format!("unparsable id_token claims: {e}")))
    }
}

/// Registered OIDC provider
///
/// One instance lives in the application state. Discovery runs lazily on
/// first use and is cached for the lifetime of the process.
pub struct OidcProvider {
    client_id: String,
    client_secret: String,
    metadata_url: String,
    http: reqwest::Client,
    metadata: OnceCell<ProviderMetadata>,
}

impl OidcProvider {
    /// Register the provider from configuration
    pub fn new(config: &AppConfig, http: reqwest::Client) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            metadata_url: config.google_metadata_url.clone(),
            http,
            metadata: OnceCell::new(),
        }
    }

    async fn metadata(&self) -> Result<&ProviderMetadata> {
        self.metadata
            .get_or_try_init(|| ProviderMetadata::discover(&self.http, &self.metadata_url))
            .await
    }

    /// Build the authorization-redirect URL for the consent page
    pub async fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<Url> {
        let metadata = self.metadata().await?;
        authorization_url(
            &metadata.authorization_endpoint,
            &self.client_id,
            redirect_uri,
            state,
        )
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let metadata = self.metadata().await?;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];

        let response = self
            .http
            .post(&metadata.token_endpoint)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Oidc(format!(
                "token exchange failed with status {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Oidc(format!("invalid token response: {e}")))
    }
}

fn authorization_url(
    endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| AppError::Oidc(format!("invalid authorization endpoint: {e}")))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", SCOPES)
        .append_pair("state", state);

    Ok(url)
}

/// Generate a random state parameter tying `/login` to its callback
pub fn generate_state() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
