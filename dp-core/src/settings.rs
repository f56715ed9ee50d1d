//! Application Settings
//!
//! Persistent settings stored as JSON in ~/.config/devprint/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use crate::constants;
use crate::error::Result;
use crate::fingerprint::EntropyModel;
use crate::DevprintError;

// ============================================================================
// Cached Settings
// ============================================================================

static SETTINGS_CACHE: OnceLock<RwLock<Option<Settings>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<Option<Settings>> {
    SETTINGS_CACHE.get_or_init(|| RwLock::new(None))
}

/// Get cached settings, loading from disk on first access.
/// A missing or invalid file yields the defaults.
pub fn get_cached_settings() -> Settings {
    if let Ok(guard) = get_cache().read() {
        if let Some(ref settings) = *guard {
            return settings.clone();
        }
    }

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Using default settings: {}", e);
            Settings::default()
        }
    };
    install_settings(settings.clone());
    settings
}

/// Replace the cached settings (e.g. after loading from an explicit path)
pub fn install_settings(settings: Settings) {
    if let Ok(mut guard) = get_cache().write() {
        *guard = Some(settings);
    }
}

// ============================================================================
// Settings model
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub public_ip: PublicIpSettings,

    #[serde(default)]
    pub fingerprint: FingerprintSettings,

    #[serde(default)]
    pub host: HostSettings,
}

/// Response body shape of a public-IP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointFormat {
    /// `{"ip": "203.0.113.7"}`
    Json,
    /// The bare address, possibly with trailing whitespace
    Text,
}

impl EndpointFormat {
    /// Guess the format from a URL: `format=json` query means JSON
    pub fn infer(url: &str) -> Self {
        if url.contains("format=json") {
            EndpointFormat::Json
        } else {
            EndpointFormat::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    pub format: EndpointFormat,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let format = EndpointFormat::infer(&url);
        Self { url, format }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIpSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for PublicIpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoints: default_endpoints(),
            refresh_interval_secs: default_refresh_interval_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl PublicIpSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintSettings {
    /// Replaces the bundled reference table when set
    #[serde(default)]
    pub frequency_table_path: Option<PathBuf>,

    #[serde(default)]
    pub entropy_model: EntropyModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSettings {
    #[serde(default = "default_battery_poll_ms")]
    pub battery_poll_ms: u64,

    #[serde(default = "default_network_poll_ms")]
    pub network_poll_ms: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            battery_poll_ms: default_battery_poll_ms(),
            network_poll_ms: default_network_poll_ms(),
        }
    }
}

fn default_true() -> bool { true }
fn default_refresh_interval_secs() -> u64 { constants::public_ip::REFRESH_INTERVAL.as_secs() }
fn default_retry_delay_secs() -> u64 { constants::public_ip::RETRY_DELAY.as_secs() }
fn default_request_timeout_ms() -> u64 { constants::public_ip::REQUEST_TIMEOUT.as_millis() as u64 }
fn default_battery_poll_ms() -> u64 { constants::host::DEFAULT_BATTERY_POLL_MS }
fn default_network_poll_ms() -> u64 { constants::host::DEFAULT_NETWORK_POLL_MS }

fn default_endpoints() -> Vec<EndpointConfig> {
    constants::public_ip::DEFAULT_ENDPOINTS
        .iter()
        .map(|url| EndpointConfig::new(*url))
        .collect()
}

impl Settings {
    /// Reject settings the resolver or host pollers cannot run with
    pub fn validate(&self) -> Result<()> {
        let ip = &self.public_ip;
        if ip.refresh_interval_secs == 0 {
            return Err(DevprintError::invalid_config("public_ip.refresh_interval_secs", "must be greater than zero"));
        }
        if ip.retry_delay_secs == 0 {
            return Err(DevprintError::invalid_config("public_ip.retry_delay_secs", "must be greater than zero"));
        }
        if ip.request_timeout_ms == 0 {
            return Err(DevprintError::invalid_config("public_ip.request_timeout_ms", "must be greater than zero"));
        }
        if ip.enabled && ip.endpoints.is_empty() {
            return Err(DevprintError::invalid_config("public_ip.endpoints", "at least one endpoint is required"));
        }
        for endpoint in &ip.endpoints {
            if !(endpoint.url.starts_with("http://") || endpoint.url.starts_with("https://")) {
                return Err(DevprintError::invalid_config(
                    "public_ip.endpoints",
                    format!("{} is not an http(s) URL", endpoint.url),
                ));
            }
        }
        if self.host.battery_poll_ms == 0 {
            return Err(DevprintError::invalid_config("host.battery_poll_ms", "must be greater than zero"));
        }
        if self.host.network_poll_ms == 0 {
            return Err(DevprintError::invalid_config("host.network_poll_ms", "must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Load / save
// ============================================================================

/// Get the settings file path
/// Linux/BSD: ~/.config/devprint/settings.json
pub fn get_settings_path() -> Result<PathBuf> {
    let devprint_dir = constants::paths::user_config_dir()
        .ok_or_else(|| DevprintError::config("Could not determine config directory"))?;

    Ok(devprint_dir.join(constants::paths::SETTINGS_FILE))
}

/// Load settings from the default location
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load and validate settings from `path`; a missing file yields defaults
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path).map_err(|source| DevprintError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let settings: Settings = serde_json::from_str(&content).map_err(|e| {
        DevprintError::config(format!("Failed to parse settings JSON: {}", e))
    })?;

    settings.validate()?;
    Ok(settings)
}

/// Save settings to `path`.
/// Uses atomic write (temp file + rename) to prevent corruption on crash
pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    use std::io::Write;

    settings.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| DevprintError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    let temp_path = path.with_extension("json.tmp");
    let write_err = |source| DevprintError::FileWrite {
        path: temp_path.clone(),
        source,
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(json.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|source| DevprintError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
