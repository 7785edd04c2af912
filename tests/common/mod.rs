//! Common test utilities for E2E tests

use portico::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Claims the stub provider asserts in its ID tokens
pub const TEST_EMAIL: &str = "a@b.com";
pub const TEST_SUBJECT: &str = "1234567890";

/// Test server instance
///
/// Spawns the application against fixture template/static directories and
/// a stub identity provider, both on random local ports. The client keeps
/// a cookie jar and does not follow redirects, so tests can observe the
/// 303 responses directly.
pub struct TestServer {
    pub addr: String,
    pub provider_addr: String,
    pub client: reqwest::Client,
    pub _temp_dir: TempDir,
}

impl TestServer {
    /// Create a new test server instance with default configuration
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server, adjusting the configuration first
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let templates = temp_dir.path().join("templates");
        let statics = temp_dir.path().join("static");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::create_dir_all(&statics).unwrap();

        // Minimal templates with markers the assertions can grep for.
        for (name, body) in [
            ("index", "<main id=\"admin\">{{user}}</main>"),
            ("no", "<main id=\"home\">{{user}}</main>"),
            ("404", "<main id=\"not-found\"></main>"),
            ("500", "<main id=\"server-error\"></main>"),
        ] {
            std::fs::write(templates.join(format!("{name}.hbs")), body).unwrap();
        }
        std::fs::write(statics.join("style.css"), "body { margin: 0 }").unwrap();

        let provider_addr = spawn_stub_provider().await;

        let mut config = config::AppConfig {
            debug: false,
            database_url: None,
            secret_key: "test-secret-key-32-bytes-long!!!".to_string(),
            allowed_hosts: String::new(),
            templates,
            static_dir: statics,
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: None,
            google_client_id: "test-client-id".to_string(),
            google_client_secret: "test-client-secret".to_string(),
            google_metadata_url: format!("{provider_addr}/.well-known/openid-configuration"),
        };
        adjust(&mut config);

        let state = AppState::new(config).unwrap();
        let app = portico::build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            addr,
            provider_addr,
            client,
            _temp_dir: temp_dir,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Drive the login round trip against the stub provider
    ///
    /// Leaves the signed-in session cookie in the client's jar.
    pub async fn sign_in(&self) {
        let response = self
            .client
            .get(self.url("/login"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 303, "login must redirect");

        let location = response.headers()["location"].to_str().unwrap();
        let auth_url = url::Url::parse(location).unwrap();
        let state = auth_url
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.to_string())
            .expect("authorization URL must carry a state parameter");

        let response = self
            .client
            .get(self.url(&format!("/auth?code=test-code&state={state}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 303, "callback must redirect");
        assert_eq!(response.headers()["location"], "/admin");
    }
}

/// Spawn a stub identity provider on a random port
///
/// Serves a discovery document pointing back at itself and a token
/// endpoint returning a canned response with an unsigned ID token.
async fn spawn_stub_provider() -> String {
    use axum::routing::{get, post};
    use axum::{Json, Router};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let discovery = {
        let base = base.clone();
        move || {
            let base = base.clone();
            async move {
                Json(serde_json::json!({
                    "issuer": base,
                    "authorization_endpoint": format!("{base}/authorize"),
                    "token_endpoint": format!("{base}/token"),
                }))
            }
        }
    };

    let app = Router::new()
        .route("/.well-known/openid-configuration", get(discovery))
        .route("/token", post(token_endpoint));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base
}

async fn token_endpoint() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "access_token": "test-access-token",
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": "openid email profile",
        "id_token": make_id_token(),
    }))
}

/// Build an unsigned ID token carrying the test claims
fn make_id_token() -> String {
    use base64::{Engine as _, engine::general_purpose};

    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(
        serde_json::json!({
            "sub": TEST_SUBJECT,
            "email": TEST_EMAIL,
            "name": "Test User",
            "picture": "https://example.com/avatar.png",
            "aud": "test-client-id",
        })
        .to_string(),
    );

    format!("{header}.{payload}.unsigned")
}
