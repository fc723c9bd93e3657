//! OAuth 2.0 consent flow for Google APIs.
//!
//! Implements the Authorization Code flow with PKCE (Proof Key for Code
//! Exchange), using a loopback redirect for desktop applications. Consent is
//! always forced (`prompt=consent`), matching the sign-in behaviour of the
//! rendered widget: every sign-in goes through the provider's consent page.
//!
//! # Flow Overview
//!
//! 1. Generate a cryptographic code verifier and its SHA-256 challenge
//! 2. Start a local HTTP server on an available port
//! 3. Build the authorization URL with the challenge
//! 4. Open the user's browser to Google's consent page
//! 5. User grants permission; Google redirects to our local server
//! 6. Extract the authorization code from the redirect
//! 7. Exchange the code (with verifier) for an access token
//!
//! The provider's callback-style completion is funnelled through a
//! single-resolution channel, so callers see one ordinary future that
//! resolves exactly once with success or failure.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use agenda_core::AccessToken;

use crate::api::{BoxFuture, IdentityFlow};
use crate::error::{ApiError, ApiResult};

/// Google OAuth endpoints.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Timeout for waiting for the OAuth callback.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

/// OAuth 2.0 credentials for Google API access.
///
/// Users must provide their own OAuth client ID and secret, as Google
/// requires registered applications for API access.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Validates that the credentials appear to be correctly formatted.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// The interactive consent flow.
///
/// Each [`request_token`](ConsentFlow::request_token) call runs one full
/// consent interaction; concurrent calls each open their own consent page
/// (they are not coalesced).
pub struct ConsentFlow {
    credentials: OAuthCredentials,
    scopes: Vec<String>,
    loopback_port_range: (u16, u16),
    http_client: reqwest::Client,
}

impl ConsentFlow {
    /// Creates a new consent flow with the given credentials and scopes.
    pub fn new(
        credentials: OAuthCredentials,
        scopes: Vec<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            credentials,
            scopes,
            loopback_port_range: (8080, 8090),
            http_client,
        })
    }

    /// Sets the port range for the loopback callback server.
    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    /// Runs the consent flow and returns the obtained access token.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] with code `Auth` if the user denies
    /// authorization, cancels, or the callback times out, and with the
    /// appropriate transport code if token exchange fails.
    pub async fn acquire_token(&self) -> ApiResult<AccessToken> {
        let pkce = PkceFlow::new();

        // Find an available port and start the callback server
        let (listener, port) = Self::bind_loopback_server(self.loopback_port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);

        let auth_url = pkce.build_auth_url(&self.credentials.client_id, &redirect_uri, &self.scopes);

        info!("starting consent flow, opening browser...");
        debug!("authorization URL: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            // Print URL for manual copy
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        // Wait for the callback
        let (code, received_state) = Self::wait_for_callback(listener)?;

        if received_state != pkce.state {
            return Err(ApiError::auth("OAuth state mismatch - possible CSRF attack"));
        }

        info!("received authorization code, exchanging for a token...");
        self.exchange_code(&code, &pkce.verifier, &redirect_uri).await
    }

    /// Revokes an access token with the provider.
    pub async fn revoke(&self, token: &AccessToken) -> ApiResult<()> {
        let response = self
            .http_client
            .post(GOOGLE_REVOKE_URL)
            .form(&[("token", token.secret())])
            .send()
            .await
            .map_err(|e| ApiError::network(format!("revoke request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::auth(format!(
                "token revocation failed ({}): {}",
                status, body
            )));
        }

        info!("access token revoked");
        Ok(())
    }

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> ApiResult<AccessToken> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::network(format!("token exchange request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ApiError::auth(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::invalid_response(format!("invalid token response: {}", e)))?;

        info!("successfully obtained access token");
        Ok(AccessToken::new(token_response.access_token))
    }

    /// Tries to bind a TCP listener on an available port in the given range.
    fn bind_loopback_server(port_range: (u16, u16)) -> ApiResult<(TcpListener, u16)> {
        for port in port_range.0..=port_range.1 {
            match TcpListener::bind(format!("127.0.0.1:{}", port)) {
                Ok(listener) => {
                    debug!("bound loopback server on port {}", port);
                    return Ok((listener, port));
                }
                Err(_) => continue,
            }
        }
        Err(ApiError::configuration(format!(
            "no available port in range {}-{}",
            port_range.0, port_range.1
        )))
    }

    /// Waits for the OAuth callback and extracts the authorization code.
    ///
    /// The callback arrives on a background thread; the result is funnelled
    /// through a channel so this resolves exactly once, success or failure.
    fn wait_for_callback(listener: TcpListener) -> ApiResult<(String, String)> {
        listener
            .set_nonblocking(false)
            .map_err(|e| ApiError::internal(format!("failed to set blocking: {}", e)))?;

        let (tx, rx) = mpsc::channel();

        let _handle = thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        if let Some(result) = Self::handle_callback(stream) {
                            let _ = tx.send(result);
                            return;
                        }
                    }
                    Err(e) => {
                        error!("failed to accept connection: {}", e);
                    }
                }
            }
        });

        match rx.recv_timeout(CALLBACK_TIMEOUT) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(ApiError::auth("consent timed out, sign in again to retry"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ApiError::internal("callback channel disconnected"))
            }
        }
    }

    /// Handles an incoming HTTP request on the callback server.
    fn handle_callback(mut stream: TcpStream) -> Option<ApiResult<(String, String)>> {
        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();

        if reader.read_line(&mut request_line).is_err() {
            return None;
        }

        // Parse the request line: GET /callback?code=...&state=... HTTP/1.1
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() < 2 || parts[0] != "GET" {
            return None;
        }

        let path = parts[1];
        if !path.starts_with("/callback") {
            return None;
        }

        let query_start = path.find('?').map(|i| i + 1).unwrap_or(path.len());
        let query = &path[query_start..];

        let mut code = None;
        let mut state = None;
        let mut callback_error = None;

        for param in query.split('&') {
            let mut kv = param.splitn(2, '=');
            if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
                match key {
                    "code" => {
                        code = Some(urlencoding::decode(value).unwrap_or_default().into_owned())
                    }
                    "state" => {
                        state = Some(urlencoding::decode(value).unwrap_or_default().into_owned())
                    }
                    "error" => {
                        callback_error =
                            Some(urlencoding::decode(value).unwrap_or_default().into_owned())
                    }
                    _ => {}
                }
            }
        }

        // Send response to browser
        let response = if callback_error.is_some() || code.is_none() {
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Authorization Failed</h1>\
            <p>You can close this window.</p></body></html>"
        } else {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Authorization Successful</h1>\
            <p>You can close this window and return to the terminal.</p></body></html>"
        };

        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();

        if let Some(callback_error) = callback_error {
            return Some(Err(ApiError::auth(format!(
                "authorization denied: {}",
                callback_error
            ))));
        }

        match (code, state) {
            (Some(c), Some(s)) => Some(Ok((c, s))),
            (Some(c), None) => Some(Ok((c, String::new()))),
            _ => Some(Err(ApiError::auth("missing authorization code in callback"))),
        }
    }
}

impl IdentityFlow for ConsentFlow {
    fn request_token(&self) -> BoxFuture<'_, ApiResult<AccessToken>> {
        Box::pin(async move { self.acquire_token().await })
    }

    fn revoke_token<'a>(&'a self, token: &'a AccessToken) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move { self.revoke(token).await })
    }
}

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = Self::generate_verifier();
        let challenge = Self::compute_challenge(&verifier);
        let state = Self::generate_state();

        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// Generates a cryptographically random code verifier.
    fn generate_verifier() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..CODE_VERIFIER_LENGTH).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Computes the SHA-256 challenge for a code verifier.
    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    /// Generates a random state string for CSRF protection.
    fn generate_state() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Builds the Google OAuth authorization URL.
    ///
    /// Consent is always forced; the user goes through the consent page on
    /// every sign-in.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}
