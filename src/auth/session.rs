//! Session management
//!
//! Uses HMAC-signed tokens stored in a single `session` cookie.
//! No server-side session storage needed.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Identity claims asserted by the provider inside the ID token
///
/// Only the claims actually consumed are modeled; anything else in the
/// token is ignored. All fields are optional — the provider decides what
/// it asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Session data carried by the cookie
///
/// `user` is `None` for anonymous visitors. `oauth_state` only exists
/// between `/login` and the `/auth` callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserClaims>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_state: Option<String>,
}

/// Create a signed session token
///
/// Token format: base64url(payload).base64url(hmac_sha256(payload))
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload =
        serde_json::to_string(session).map_err(|e| AppError::Session(e.to_string()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Session(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns error if the signature is invalid or the token is malformed
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let Some((payload_b64, signature_b64)) = token.split_once('.') else {
        return Err(AppError::Session("malformed session token".to_string()));
    };

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Session(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Session("malformed session signature".to_string()))?;

    mac.verify_slice(&signature)
        .map_err(|_| AppError::Session("invalid session signature".to_string()))?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Session("malformed session payload".to_string()))?;

    serde_json::from_slice(&payload).map_err(|e| AppError::Session(e.to_string()))
}

/// Read the session from the request cookies
///
/// A missing, tampered, or otherwise undecodable cookie yields the
/// anonymous session rather than an error.
pub fn session_from_jar(jar: &CookieJar, secret: &str) -> Session {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| verify_session_token(cookie.value(), secret).ok())
        .unwrap_or_default()
}

/// Write the session back into the cookie jar
pub fn store_session(
    jar: CookieJar,
    session: &Session,
    secret: &str,
) -> Result<CookieJar, AppError> {
    let token = create_session_token(session, secret)?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    // Lax so the cookie survives the top-level redirect back from the
    // provider's consent page.
    cookie.set_same_site(SameSite::Lax);

    Ok(jar.add(cookie))
}
