//! Observation types published by the host's state streams

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::constants::codecs::SOFTWARE_CODEC_PREFIX;
use crate::stream::Absent;

/// Identifies one upstream slot of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Location,
    Network,
    PublicNetwork,
    Battery,
    Sensors,
    Codecs,
    Software,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Location => "location",
            SourceKind::Network => "network",
            SourceKind::PublicNetwork => "public-network",
            SourceKind::Battery => "battery",
            SourceKind::Sensors => "sensors",
            SourceKind::Codecs => "codecs",
            SourceKind::Software => "software",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Location
// ============================================================================

/// A single position fix.
///
/// Satellite fields often arrive on a later emission than the position itself;
/// see [`LocationFix::with_satellites`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: Option<f64>,
    /// Horizontal accuracy radius in meters
    pub accuracy_m: Option<f32>,
    pub bearing_deg: Option<f32>,
    pub speed_mps: Option<f32>,
    pub satellites_in_view: Option<u32>,
    pub satellites_used: Option<u32>,
    pub provider: Option<String>,
    pub is_mock: bool,
    /// Fix time, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m: None,
            accuracy_m: None,
            bearing_deg: None,
            speed_mps: None,
            satellites_in_view: None,
            satellites_used: None,
            provider: None,
            is_mock: false,
            timestamp_ms,
        }
    }

    /// Copy of this fix enriched with satellite usage
    pub fn with_satellites(&self, in_view: u32, used: u32) -> Self {
        Self {
            satellites_in_view: Some(in_view),
            satellites_used: Some(used),
            ..self.clone()
        }
    }
}

/// Location accuracy setting reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyMode {
    #[default]
    Off,
    SensorsOnly,
    BatterySaving,
    HighAccuracy,
}

impl AccuracyMode {
    /// Map the platform's raw integer; unknown values read as `Off`
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => AccuracyMode::SensorsOnly,
            2 => AccuracyMode::BatterySaving,
            3 => AccuracyMode::HighAccuracy,
            _ => AccuracyMode::Off,
        }
    }

    pub fn as_raw(&self) -> u8 {
        match self {
            AccuracyMode::Off => 0,
            AccuracyMode::SensorsOnly => 1,
            AccuracyMode::BatterySaving => 2,
            AccuracyMode::HighAccuracy => 3,
        }
    }
}

// ============================================================================
// Network
// ============================================================================

/// Transport class of the active network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transport {
    Wifi,
    Cellular,
    Vpn,
    Other,
    #[default]
    None,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Wifi => "WIFI",
            Transport::Cellular => "CELLULAR",
            Transport::Vpn => "VPN",
            Transport::Other => "OTHER",
            Transport::None => "NONE",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local addressing of the active network. The default means offline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub local_ipv4: Option<Ipv4Addr>,
    pub local_ipv6: Option<Ipv6Addr>,
    pub transport: Transport,
    pub ssid: Option<String>,
    pub carrier: Option<String>,
}

impl Absent for NetworkSnapshot {
    fn absent() -> Self {
        Self::default()
    }
}

/// Resolved public (WAN) address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicNetSnapshot {
    pub ip: IpAddr,
    pub isp: Option<String>,
    pub country: Option<String>,
}

impl PublicNetSnapshot {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            isp: None,
            country: None,
        }
    }
}

// ============================================================================
// Battery
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BatteryStatus {
    Charging,
    Discharging,
    Full,
    Idle,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BatteryHealth {
    Good,
    Overheat,
    Dead,
    OverVoltage,
    #[default]
    Unknown,
}

/// Battery telemetry. The default is the "no reading yet" value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatterySnapshot {
    /// Charge level, 0-100
    pub level_pct: u8,
    pub status: BatteryStatus,
    pub health: BatteryHealth,
    pub temperature_c: f32,
    pub capacity_mah: u32,
}

impl Absent for BatterySnapshot {
    fn absent() -> Self {
        Self::default()
    }
}

// ============================================================================
// Inventories
// ============================================================================

/// One hardware sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    pub name: String,
    pub vendor: String,
    /// Platform sensor type identifier
    pub sensor_type: i32,
    pub max_range: f32,
    pub resolution: f32,
    pub power_ma: f32,
}

/// One media codec, e.g. `c2.qti.avc.decoder`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodecInfo {
    pub name: String,
    pub encoder: bool,
}

impl CodecInfo {
    pub fn new(name: impl Into<String>, encoder: bool) -> Self {
        Self {
            name: name.into(),
            encoder,
        }
    }

    /// Hardware-backed unless the name starts with the software codec prefix
    pub fn is_hardware(&self) -> bool {
        !self.name.starts_with(SOFTWARE_CODEC_PREFIX)
    }

    /// Part of the name after the last `.` (whole name if there is none)
    pub fn short_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        }
    }
}

/// One installed software package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppInfo {
    pub package_name: String,
    pub version_name: Option<String>,
    pub version_code: i64,
    /// Milliseconds since the Unix epoch
    pub first_install_ms: u64,
    pub last_update_ms: u64,
    pub is_system: bool,
    pub from_store: bool,
    /// Lowercase hex SHA-256 of the signer certificate
    pub signature_digest: String,
}

impl AppInfo {
    /// Minimal record, mostly useful in tests and adapters
    pub fn new(package_name: impl Into<String>, signature_digest: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version_name: None,
            version_code: 0,
            first_install_ms: 0,
            last_update_ms: 0,
            is_system: false,
            from_store: false,
            signature_digest: signature_digest.into(),
        }
    }
}

// ============================================================================
// Device identity
// ============================================================================

/// Static host facts that do not change during a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub brand: String,
    pub model: String,
    /// Active locale as a BCP-47 tag, e.g. `en-US`
    pub locale: String,
}

impl DeviceIdentity {
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            locale: locale.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_hardware_classification() {
        assert!(!CodecInfo::new("c2.android.avc.decoder", false).is_hardware());
        assert!(CodecInfo::new("c2.qti.hevc.decoder", false).is_hardware());
        assert!(CodecInfo::new("OMX.Exynos.AVC.Decoder", false).is_hardware());
        // only the c2.android prefix marks a software codec, and case matters
        assert!(CodecInfo::new("OMX.google.h264.decoder", false).is_hardware());
        assert!(CodecInfo::new("C2.Android.avc.decoder", false).is_hardware());
    }

    #[test]
    fn test_codec_short_name() {
        assert_eq!(CodecInfo::new("c2.qti.hevc.decoder", false).short_name(), "decoder");
        assert_eq!(CodecInfo::new("plaincodec", false).short_name(), "plaincodec");
        assert_eq!(CodecInfo::new("trailing.", false).short_name(), "");
    }

    #[test]
    fn test_satellite_enrichment_keeps_position() {
        let fix = LocationFix::new(52.52, 13.405, 1_700_000_000_000);
        let enriched = fix.with_satellites(14, 9);
        assert_eq!(enriched.latitude, fix.latitude);
        assert_eq!(enriched.satellites_used, Some(9));
        assert_eq!(enriched.satellites_in_view, Some(14));
        assert_eq!(fix.satellites_used, None);
    }

    #[test]
    fn test_accuracy_mode_raw() {
        assert_eq!(AccuracyMode::from_raw(3), AccuracyMode::HighAccuracy);
        assert_eq!(AccuracyMode::from_raw(42), AccuracyMode::Off);
        assert_eq!(AccuracyMode::BatterySaving.as_raw(), 2);
    }

    #[test]
    fn test_defaults_are_absent_values() {
        let net = NetworkSnapshot::absent();
        assert_eq!(net.transport, Transport::None);
        assert!(net.local_ipv4.is_none());
        assert_eq!(BatterySnapshot::absent().capacity_mah, 0);
    }
}
