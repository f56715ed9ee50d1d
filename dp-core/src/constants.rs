//! Constants and configuration values for devprint
//!
//! Centralizes placeholders, naming rules, timings and paths.
//! Add new magic values here rather than inline.

/// Stable placeholders written into the canonical fingerprint when a source
/// value is unavailable. Changing any of these changes every fingerprint hash.
pub mod placeholders {
    /// Brand or model could not be determined
    pub const UNKNOWN: &str = "unknown";

    /// Local IPv4 address missing from the `display` label
    pub const MISSING_ADDRESS: &str = "?";

    /// BCP-47 "undetermined" language tag
    pub const UNDETERMINED_LOCALE: &str = "und";
}

/// Canonical field names, in serialization order
pub mod fields {
    pub const BRAND: &str = "brand";
    pub const MODEL: &str = "model";
    pub const DISPLAY: &str = "display";
    pub const APPS_DIGEST: &str = "appsDigest";
    pub const SENSOR_SET: &str = "sensorSet";
    pub const CODEC_HW: &str = "codecHw";
    pub const NET_TRANSPORT: &str = "netTransport";
    pub const BATTERY_CAP: &str = "batteryCap";
    pub const LOCALE: &str = "locale";

    /// Separator used by the list-valued fields
    pub const LIST_SEPARATOR: &str = "|";
}

/// Media codec naming rules
pub mod codecs {
    /// Name prefix of the platform's software codecs (case-sensitive).
    /// Anything else is treated as hardware-backed.
    pub const SOFTWARE_CODEC_PREFIX: &str = "c2.android";
}

/// Public address resolution
pub mod public_ip {
    use std::time::Duration;

    /// Endpoints tried in order on every resolution round
    pub const DEFAULT_ENDPOINTS: &[&str] = &[
        "https://api.ipify.org?format=json",
        "https://api64.ipify.org?format=json",
        "https://ifconfig.me/ip",
        "https://icanhazip.com",
    ];

    /// Re-resolution period after a successful round (15 minutes)
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

    /// Wait before the next round when every endpoint failed
    pub const RETRY_DELAY: Duration = Duration::from_secs(30);

    /// Hard cut-off per endpoint request
    pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);
}

/// Fusion stage tuning
pub mod fusion {
    /// A failed recombination is logged on the first failure and then once
    /// every this many consecutive failures
    pub const FAILURE_LOG_EVERY: u32 = 10;
}

/// Installed-software signature handling
pub mod signature {
    /// First platform API level exposing multi-signer signing info
    pub const SIGNING_INFO_API_LEVEL: u32 = 28;
}

/// Host collaborator polling defaults
pub mod host {
    pub const DEFAULT_BATTERY_POLL_MS: u64 = 5_000;
    pub const DEFAULT_NETWORK_POLL_MS: u64 = 2_000;

    /// Lower bound applied to configured poll intervals
    pub const MIN_POLL_MS: u64 = 100;
}

/// Configuration paths
pub mod paths {
    use std::path::PathBuf;

    /// Application directory name under the user config dir
    pub const APP_DIR: &str = "devprint";

    /// Settings file name
    pub const SETTINGS_FILE: &str = "settings.json";

    /// User configuration directory (`$XDG_CONFIG_HOME/devprint` or platform default)
    pub fn user_config_dir() -> Option<PathBuf> {
        let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(xdg))
        } else if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".config"))
        } else {
            dirs::config_dir()
        };

        base.map(|p| p.join(APP_DIR))
    }
}
