use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::secret::ClientSecret;
use crate::auth::token::{StoredToken, TokenStore};
use crate::error::AuthError;

/// Scope requested for the delegated credentials.
pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Timeout for token endpoint requests (30 seconds).
const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection timeout (10 seconds).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Page shown in the browser after a successful redirect.
const CALLBACK_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
<p>You can close this window and return to stillcast.</p></body></html>";

/// Page shown in the browser when consent was denied.
const CALLBACK_DENIED_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
<p>Consent was not granted. Close this window and re-run stillcast to try again.</p></body></html>";

/// Token endpoint response for both the code exchange and the refresh grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Walks the credential states until an authorized token is available.
///
/// Order of attempts: persisted token if still fresh, silent refresh if a
/// refresh token exists, interactive consent otherwise. Whatever succeeds
/// is persisted before being returned.
pub struct Authenticator {
    secret: ClientSecret,
    store: TokenStore,
    callback_port: u16,
    http: reqwest::Client,
}

impl Authenticator {
    pub fn new(
        secret: ClientSecret,
        store: TokenStore,
        callback_port: u16,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            secret,
            store,
            callback_port,
            http,
        })
    }

    /// Produce an authorized credential, or a fatal setup error.
    pub async fn authorize(&self) -> Result<StoredToken, AuthError> {
        if let Some(token) = self.store.load() {
            if !token.is_expired() {
                debug!("Using persisted access token");
                return Ok(token);
            }

            if let Some(refresh_token) = token.refresh_token.clone() {
                info!("Access token expired; refreshing");
                match self.refresh(&refresh_token).await {
                    Ok(fresh) => {
                        self.store.save(&fresh)?;
                        return Ok(fresh);
                    }
                    Err(e) => {
                        warn!("Refresh failed ({}); falling back to interactive authorization", e);
                    }
                }
            }
        }

        let fresh = self.interactive().await?;
        self.store.save(&fresh)?;
        Ok(fresh)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh response usually omits the refresh token; the previous
    /// one is carried over so later runs stay non-interactive.
    pub async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError> {
        let params = [
            ("client_id", self.secret.installed.client_id.as_str()),
            ("client_secret", self.secret.installed.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.secret.installed.token_uri)
            .form(&params)
            .send()
            .await?;

        let token = Self::parse_token_response(response, Some(refresh_token.to_string())).await?;
        Ok(token)
    }

    /// Run the interactive consent flow: print the consent URL, wait for
    /// the redirect on the local listener, exchange the code.
    async fn interactive(&self) -> Result<StoredToken, AuthError> {
        let consent_url = self.consent_url()?;

        info!("Authorization required. Open this URL in a browser:");
        info!("  {}", consent_url);

        let code = self.wait_for_code().await?;
        debug!("Authorization code received; exchanging for tokens");

        self.exchange_code(&code).await
    }

    /// Exchange an authorization code for an access/refresh token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
        let redirect_uri = self.redirect_uri();
        let params = [
            ("code", code),
            ("client_id", self.secret.installed.client_id.as_str()),
            ("client_secret", self.secret.installed.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.secret.installed.token_uri)
            .form(&params)
            .send()
            .await?;

        Self::parse_token_response(response, None).await
    }

    async fn parse_token_response(
        response: reqwest::Response,
        carry_refresh: Option<String>,
    ) -> Result<StoredToken, AuthError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AuthError::TokenRejected { status, body });
        }

        let token: TokenResponse = response.json().await?;

        Ok(StoredToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(carry_refresh),
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
            token_type: token.token_type,
            scope: token.scope,
        })
    }

    /// Redirect URI the consent flow sends the browser back to.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.callback_port)
    }

    /// Build the consent URL the user opens in a browser.
    pub fn consent_url(&self) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.secret.installed.auth_uri,
            &[
                ("client_id", self.secret.installed.client_id.as_str()),
                ("redirect_uri", self.redirect_uri().as_str()),
                ("response_type", "code"),
                ("scope", UPLOAD_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AuthError::InvalidEndpoint {
            uri: self.secret.installed.auth_uri.clone(),
            reason: e.to_string(),
        })?;

        Ok(url.into())
    }

    /// Listen on the fixed local port for the authorization redirect and
    /// extract the code from the request.
    async fn wait_for_code(&self) -> Result<String, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", self.callback_port))
            .await
            .map_err(|e| AuthError::CallbackFailed {
                reason: format!("could not bind port {}: {}", self.callback_port, e),
            })?;

        info!("Waiting for the redirect on {} ...", self.redirect_uri());

        let (mut stream, _) = listener.accept().await.map_err(|e| AuthError::CallbackFailed {
            reason: format!("accept failed: {}", e),
        })?;

        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await.map_err(|e| AuthError::CallbackFailed {
            reason: format!("could not read redirect request: {}", e),
        })?;

        let request = String::from_utf8_lossy(&buf[..n]);
        let request_line = request.lines().next().unwrap_or_default();
        let result = parse_callback_request(request_line);

        let page = if result.is_ok() {
            CALLBACK_PAGE
        } else {
            CALLBACK_DENIED_PAGE
        };
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            page.len(),
            page
        );
        if let Err(e) = stream.write_all(reply.as_bytes()).await {
            warn!("Could not answer the browser redirect: {}", e);
        }

        result
    }
}

/// Extract the authorization code from the redirect's request line,
/// e.g. `GET /?code=4%2Fabc&scope=... HTTP/1.1`.
fn parse_callback_request(request_line: &str) -> Result<String, AuthError> {
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::CallbackFailed {
            reason: format!("malformed request line: {:?}", request_line),
        })?;

    let url = Url::parse(&format!("http://localhost{}", path)).map_err(|e| {
        AuthError::CallbackFailed {
            reason: format!("unparseable redirect path {:?}: {}", path, e),
        }
    })?;

    let mut code = None;
    let mut denial = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => denial = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(reason) = denial {
        return Err(AuthError::ConsentDenied { reason });
    }

    code.ok_or_else(|| AuthError::CallbackFailed {
        reason: "redirect carried no authorization code".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secret::InstalledApp;
    use tempfile::tempdir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secret_with_token_uri(token_uri: &str) -> ClientSecret {
        ClientSecret {
            installed: InstalledApp {
                client_id: "client-id.apps.example.com".to_string(),
                client_secret: "s3cret".to_string(),
                auth_uri: "https://accounts.example.com/o/oauth2/auth".to_string(),
                token_uri: token_uri.to_string(),
                redirect_uris: vec!["http://localhost".to_string()],
            },
        }
    }

    fn authenticator(token_uri: &str, dir: &std::path::Path) -> Authenticator {
        Authenticator::new(
            secret_with_token_uri(token_uri),
            TokenStore::new(dir.join("token.json")),
            8080,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_callback_extracts_code() {
        let code = parse_callback_request("GET /?code=abc123&scope=upload HTTP/1.1").unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn test_parse_callback_percent_decodes() {
        let code = parse_callback_request("GET /?code=4%2F0Axyz HTTP/1.1").unwrap();
        assert_eq!(code, "4/0Axyz");
    }

    #[test]
    fn test_parse_callback_denied() {
        let result = parse_callback_request("GET /?error=access_denied HTTP/1.1");
        assert!(matches!(result, Err(AuthError::ConsentDenied { .. })));
    }

    #[test]
    fn test_parse_callback_without_code() {
        let result = parse_callback_request("GET /favicon.ico HTTP/1.1");
        assert!(matches!(result, Err(AuthError::CallbackFailed { .. })));
    }

    #[test]
    fn test_parse_callback_empty_line() {
        let result = parse_callback_request("");
        assert!(matches!(result, Err(AuthError::CallbackFailed { .. })));
    }

    #[test]
    fn test_consent_url_carries_flow_parameters() {
        let dir = tempdir().unwrap();
        let auth = authenticator("https://oauth2.example.com/token", dir.path());

        let url = auth.consent_url().unwrap();
        assert!(url.starts_with("https://accounts.example.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=client-id.apps.example.com"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("youtube.upload"));
        assert!(url.contains("localhost%3A8080"));
    }

    #[tokio::test]
    async fn test_exchange_code_returns_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3600,
                "refresh_token": "1//refresh",
                "scope": UPLOAD_SCOPE,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let auth = authenticator(&format!("{}/token", server.uri()), dir.path());

        let token = auth.exchange_code("auth-code").await.unwrap();
        assert_eq!(token.access_token, "ya29.fresh");
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_refresh_carries_over_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.refreshed",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let auth = authenticator(&format!("{}/token", server.uri()), dir.path());

        let token = auth.refresh("1//old-refresh").await.unwrap();
        assert_eq!(token.access_token, "ya29.refreshed");
        // The grant response had no refresh token; the old one is kept.
        assert_eq!(token.refresh_token.as_deref(), Some("1//old-refresh"));
    }

    #[tokio::test]
    async fn test_rejected_exchange_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let auth = authenticator(&format!("{}/token", server.uri()), dir.path());

        let result = auth.exchange_code("stale-code").await;
        match result {
            Err(AuthError::TokenRejected { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("Expected TokenRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authorize_uses_fresh_persisted_token() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&StoredToken {
                access_token: "ya29.cached".to_string(),
                refresh_token: Some("1//refresh".to_string()),
                expires_at: Utc::now() + chrono::Duration::hours(1),
                token_type: "Bearer".to_string(),
                scope: None,
            })
            .unwrap();

        // Token endpoint unreachable on purpose: a fresh persisted token
        // must not trigger any network traffic.
        let auth = Authenticator::new(
            secret_with_token_uri("http://127.0.0.1:9/token"),
            store,
            8080,
        )
        .unwrap();

        let token = auth.authorize().await.unwrap();
        assert_eq!(token.access_token, "ya29.cached");
    }

    #[tokio::test]
    async fn test_authorize_refreshes_expired_token_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.renewed",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&StoredToken {
                access_token: "ya29.stale".to_string(),
                refresh_token: Some("1//refresh".to_string()),
                expires_at: Utc::now() - chrono::Duration::hours(1),
                token_type: "Bearer".to_string(),
                scope: None,
            })
            .unwrap();

        let auth = Authenticator::new(
            secret_with_token_uri(&format!("{}/token", server.uri())),
            TokenStore::new(dir.path().join("token.json")),
            8080,
        )
        .unwrap();

        let token = auth.authorize().await.unwrap();
        assert_eq!(token.access_token, "ya29.renewed");

        // The refreshed token replaced the stale one on disk.
        let persisted = TokenStore::new(dir.path().join("token.json")).load().unwrap();
        assert_eq!(persisted.access_token, "ya29.renewed");
        assert_eq!(persisted.refresh_token.as_deref(), Some("1//refresh"));
    }
}
