//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/agenda/config.toml` by default. OAuth credentials may instead
//! come from CLI flags or the `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`
//! environment variables (the flags are env-backed).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use agenda_core::WindowStrategy;
use agenda_google::OAuthCredentials;

/// Configuration for the agenda client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google credential settings.
    pub google: GoogleSettings,

    /// Display settings.
    pub display: DisplaySettings,
}

/// Google credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth 2.0 client ID.
    pub client_id: Option<String>,

    /// OAuth 2.0 client secret.
    pub client_secret: Option<String>,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            timeout: 30,
        }
    }
}

/// Display settings for the rendered view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Which window of events to show.
    pub window: WindowStrategy,

    /// Text to show when the window contains no events.
    pub no_events_text: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            window: WindowStrategy::default(),
            no_events_text: "No events in this window.".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agenda")
    }
}

/// Resolves OAuth credentials from CLI flags or `config.toml`.
///
/// CLI flags win over the config file. Providing only one of the two flags
/// is an error rather than a silent fallback.
pub fn resolve_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    config: &ClientConfig,
) -> Result<OAuthCredentials, String> {
    if let (Some(id), Some(secret)) = (&cli_client_id, &cli_client_secret) {
        return Ok(OAuthCredentials::new(id, secret));
    }

    if cli_client_id.is_some() || cli_client_secret.is_some() {
        return Err(
            "both --client-id and --client-secret are required when providing credentials directly"
                .to_string(),
        );
    }

    if let (Some(id), Some(secret)) = (&config.google.client_id, &config.google.client_secret) {
        return Ok(OAuthCredentials::new(id, secret));
    }

    Err(format!(
        "Google credentials are required. Provide via:\n  \
         - client_id + client_secret in {}\n  \
         - --client-id and --client-secret flags\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET env vars",
        ClientConfig::default_path().display()
    ))
}
