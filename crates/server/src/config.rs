use shared_types::AppConfig;
use std::path::Path;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Default config file, relative to the working directory.
const CONFIG_PATH: &str = "config.toml";

/// Read and parse a config file. A missing or unparseable file yields defaults.
pub fn read_config(path: &Path) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {e}; using defaults", path.display());
            AppConfig::default()
        }),
        Err(e) => {
            tracing::info!("{} not found ({e}); using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Apply environment overrides on top of the file values.
fn apply_env(mut config: AppConfig) -> AppConfig {
    if let Some(max) = std::env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.server.max_upload_bytes = max;
    }
    if let Ok(addr) = std::env::var("BIND_ADDR") {
        if !addr.trim().is_empty() {
            config.server.bind_addr = addr;
        }
    }
    if let Ok(dir) = std::env::var("STORAGE_DIR") {
        if !dir.trim().is_empty() {
            config.server.storage_dir = Some(dir);
        }
    }
    config
}

/// Load `config.toml` (or `$CLAIMS_CONFIG`) plus env overrides into the
/// global `OnceLock`. Only the first call has effect.
pub fn load_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| {
        let _ = dotenvy::dotenv();
        let path = std::env::var("CLAIMS_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
        let config = apply_env(read_config(Path::new(&path)));
        tracing::info!(
            alert_after_days = config.policy.alert_after_days,
            max_upload_bytes = config.server.max_upload_bytes,
            storage = config.server.storage_dir.as_deref().unwrap_or("memory"),
            "Configuration loaded"
        );
        config
    })
}
