//! Client configuration.

use std::path::PathBuf;

/// Default directory service base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default chat server base URL.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";

/// Endpoints and the identity file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Directory service base URL, e.g. `http://localhost:5000/api`
    pub api_url: String,
    /// Chat server base URL; transports connect to `{ws_url}/ws/{group}/{user}`
    pub ws_url: String,
    /// File holding the persisted identity
    pub state_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            state_path: default_state_path(),
        }
    }
}

/// `<config dir>/konnect/session.json`, or a relative path when the platform
/// has no config directory.
pub fn default_state_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("konnect").join("session.json")
}
