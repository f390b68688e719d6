use serde::{Deserialize, Serialize};

/// Business policy knobs that vary per deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    /// Open entities older than this many days are flagged with `alert`.
    #[serde(default = "default_alert_after_days")]
    pub alert_after_days: i64,
    /// Currency assumed for amounts that carry none.
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            alert_after_days: default_alert_after_days(),
            default_currency: default_currency(),
        }
    }
}

/// Reference backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Directory for stored documents. Absent means in-memory storage.
    #[serde(default)]
    pub storage_dir: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_upload_bytes: default_max_upload_bytes(),
            storage_dir: None,
        }
    }
}

/// Settings for the HTTP client used by the claim sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub client: ClientSettings,
}

fn default_alert_after_days() -> i64 {
    60
}

fn default_currency() -> String {
    "PLN".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
