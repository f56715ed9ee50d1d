//! Canonical fingerprint assembly
//!
//! Picks nine fields out of a [`FullSnapshot`], serializes them as compact
//! JSON in a fixed order and hashes the text with SHA-256.
//!
//! Unavailable sources never drop a field; they serialize to the
//! placeholders in [`crate::constants::placeholders`]:
//!
//! | field | placeholder |
//! |---|---|
//! | `brand`, `model` | `unknown` |
//! | `display` | `<transport>@?` |
//! | `appsDigest` | digest of empty input |
//! | `sensorSet`, `codecHw` | empty string |
//! | `netTransport` | `none` |
//! | `batteryCap` | `0` |
//! | `locale` | `und` |

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::digest::sha256_hex;
use super::entropy::{estimate_entropy, EntropyModel};
use super::frequency::FrequencyTable;
use crate::constants::fields::{self, LIST_SEPARATOR};
use crate::constants::placeholders::{MISSING_ADDRESS, UNDETERMINED_LOCALE, UNKNOWN};
use crate::data::FullSnapshot;
use crate::error::Result;

/// The nine canonical fields, declared in serialization order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFields {
    pub brand: String,
    pub model: String,
    pub display: String,
    pub apps_digest: String,
    pub sensor_set: String,
    pub codec_hw: String,
    pub net_transport: String,
    pub battery_cap: u32,
    pub locale: String,
}

impl CanonicalFields {
    pub fn from_snapshot(snapshot: &FullSnapshot) -> Self {
        let transport = snapshot.network.transport.as_str().to_lowercase();
        let address = snapshot
            .network
            .local_ipv4
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| MISSING_ADDRESS.to_string());

        Self {
            brand: identity_text(&snapshot.device.brand),
            model: identity_text(&snapshot.device.model),
            display: format!("{}@{}", transport, address),
            apps_digest: snapshot.apps_digest().to_string(),
            sensor_set: snapshot
                .sensors
                .iter()
                .map(|s| s.sensor_type.to_string())
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
            codec_hw: snapshot
                .codecs
                .iter()
                .filter(|c| c.is_hardware())
                .map(|c| c.short_name())
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
            net_transport: transport,
            battery_cap: snapshot.battery.capacity_mah,
            locale: normalize_locale(&snapshot.device.locale),
        }
    }

    /// `(field name, textual value)` pairs in canonical order
    pub fn entries(&self) -> [(&'static str, String); 9] {
        [
            (fields::BRAND, self.brand.clone()),
            (fields::MODEL, self.model.clone()),
            (fields::DISPLAY, self.display.clone()),
            (fields::APPS_DIGEST, self.apps_digest.clone()),
            (fields::SENSOR_SET, self.sensor_set.clone()),
            (fields::CODEC_HW, self.codec_hw.clone()),
            (fields::NET_TRANSPORT, self.net_transport.clone()),
            (fields::BATTERY_CAP, self.battery_cap.to_string()),
            (fields::LOCALE, self.locale.clone()),
        ]
    }

    /// Compact JSON in field order; byte-identical for equal fields
    pub fn canonical_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fingerprint attached to the final state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintBundle {
    pub canonical_text: String,
    /// Lowercase hex SHA-256 of `canonical_text`
    pub digest_hex: String,
    pub entropy_bits: f64,
    pub uniqueness_estimate: u64,
}

impl FingerprintBundle {
    /// Bundle of an empty canonical text; used only before a first
    /// successful assembly
    pub fn empty() -> Self {
        Self {
            canonical_text: String::new(),
            digest_hex: sha256_hex(b""),
            entropy_bits: 0.0,
            uniqueness_estimate: 1,
        }
    }
}

/// Assemble with the reference entropy model
pub fn assemble(snapshot: &FullSnapshot, table: &FrequencyTable) -> Result<FingerprintBundle> {
    assemble_with(snapshot, table, EntropyModel::default())
}

/// Build, serialize, hash and score the canonical fields of `snapshot`.
///
/// Pure: the same snapshot and table always give the same bundle.
pub fn assemble_with(
    snapshot: &FullSnapshot,
    table: &FrequencyTable,
    model: EntropyModel,
) -> Result<FingerprintBundle> {
    let fields = CanonicalFields::from_snapshot(snapshot);
    let canonical_text = fields.canonical_text()?;
    let digest_hex = sha256_hex(canonical_text.as_bytes());
    let estimate = estimate_entropy(&fields, table, model);

    Ok(FingerprintBundle {
        canonical_text,
        digest_hex,
        entropy_bits: estimate.bits,
        uniqueness_estimate: estimate.uniqueness,
    })
}

/// Lower-cased as reported; blank values take the placeholder
fn identity_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        raw.to_lowercase()
    }
}

fn locale_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z]{2,8}(-[A-Za-z0-9]{1,8})*$").ok())
        .as_ref()
}

/// Accept `en-US` and `en_US`; anything else becomes `und`
fn normalize_locale(raw: &str) -> String {
    let tag = raw.trim().replace('_', "-");
    if locale_pattern().is_some_and(|re| re.is_match(&tag)) {
        tag
    } else {
        UNDETERMINED_LOCALE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::*;
    use std::net::Ipv4Addr;

    fn snapshot(ipv4: Option<Ipv4Addr>, location: Option<LocationFix>) -> FullSnapshot {
        FullSnapshot::from_parts(SnapshotParts {
            device: DeviceIdentity::new("Acme", "Rocket 3", "en-US"),
            quad: Quad {
                location,
                network: NetworkSnapshot {
                    local_ipv4: ipv4,
                    transport: Transport::Wifi,
                    ..NetworkSnapshot::default()
                },
                public_net: None,
                battery: BatterySnapshot {
                    capacity_mah: 5000,
                    ..BatterySnapshot::default()
                },
                terminated: Vec::new(),
            },
            sensors: vec![
                SensorInfo {
                    name: "accel".into(),
                    vendor: "bosch".into(),
                    sensor_type: 1,
                    max_range: 78.4,
                    resolution: 0.01,
                    power_ma: 0.15,
                },
                SensorInfo {
                    name: "gyro".into(),
                    vendor: "bosch".into(),
                    sensor_type: 4,
                    max_range: 34.9,
                    resolution: 0.001,
                    power_ma: 0.9,
                },
            ],
            codecs: vec![
                CodecInfo::new("c2.qti.avc.decoder", false),
                CodecInfo::new("c2.android.aac.encoder", true),
                CodecInfo::new("c2.qti.hevc.encoder", true),
            ],
            apps: vec![AppInfo::new("a.b", "11")],
            accuracy: AccuracyMode::HighAccuracy,
            mock_location_holders: Vec::new(),
            terminated: Vec::new(),
        })
    }

    #[test]
    fn test_canonical_text_layout() {
        let snap = snapshot(Some(Ipv4Addr::new(10, 0, 0, 7)), None);
        let fields = CanonicalFields::from_snapshot(&snap);
        let text = fields.canonical_text().unwrap();
        let expected = format!(
            concat!(
                r#"{{"brand":"acme","model":"rocket 3","display":"wifi@10.0.0.7","appsDigest":"{}","#,
                r#""sensorSet":"1|4","codecHw":"decoder|encoder","netTransport":"wifi","#,
                r#""batteryCap":5000,"locale":"en-US"}}"#
            ),
            snap.apps_digest()
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let table = FrequencyTable::from_json(r#"{"brand": {"acme": 0.1}}"#).unwrap();
        let a = assemble(&snapshot(Some(Ipv4Addr::new(10, 0, 0, 7)), None), &table).unwrap();
        let b = assemble(&snapshot(Some(Ipv4Addr::new(10, 0, 0, 7)), None), &table).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digest_hex, sha256_hex(a.canonical_text.as_bytes()));
        assert_eq!(a.digest_hex.len(), 64);
    }

    #[test]
    fn test_location_does_not_affect_fingerprint() {
        let table = FrequencyTable::empty();
        let fix = LocationFix::new(48.85, 2.35, 1_700_000_000_000);
        let with = assemble(&snapshot(Some(Ipv4Addr::new(10, 0, 0, 7)), Some(fix)), &table).unwrap();
        let without = assemble(&snapshot(Some(Ipv4Addr::new(10, 0, 0, 7)), None), &table).unwrap();
        assert_eq!(with.canonical_text, without.canonical_text);
        assert_eq!(with.digest_hex, without.digest_hex);
    }

    #[test]
    fn test_missing_address_changes_only_display() {
        let present = CanonicalFields::from_snapshot(&snapshot(Some(Ipv4Addr::new(10, 0, 0, 7)), None));
        let missing = CanonicalFields::from_snapshot(&snapshot(None, None));
        assert_eq!(missing.display, "wifi@?");

        let differing: Vec<&str> = present
            .entries()
            .iter()
            .zip(missing.entries().iter())
            .filter(|(a, b)| a.1 != b.1)
            .map(|(a, _)| a.0)
            .collect();
        assert_eq!(differing, vec!["display"]);
    }

    #[test]
    fn test_identity_is_lowercased_not_trimmed() {
        assert_eq!(identity_text(" Acme "), " acme ");
        assert_eq!(identity_text("Rocket 3"), "rocket 3");
        assert_eq!(identity_text(" \t"), "unknown");
    }

    #[test]
    fn test_placeholders_for_absent_sources() {
        let snap = FullSnapshot::from_parts(SnapshotParts {
            device: DeviceIdentity::new("", "  ", "not a locale!"),
            quad: Quad::default(),
            sensors: Vec::new(),
            codecs: Vec::new(),
            apps: Vec::new(),
            accuracy: AccuracyMode::Off,
            mock_location_holders: Vec::new(),
            terminated: Vec::new(),
        });
        let fields = CanonicalFields::from_snapshot(&snap);
        assert_eq!(fields.brand, "unknown");
        assert_eq!(fields.model, "unknown");
        assert_eq!(fields.display, "none@?");
        assert_eq!(fields.sensor_set, "");
        assert_eq!(fields.codec_hw, "");
        assert_eq!(fields.net_transport, "none");
        assert_eq!(fields.battery_cap, 0);
        assert_eq!(fields.locale, "und");
        assert_eq!(
            fields.apps_digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_locale_normalization() {
        assert_eq!(normalize_locale("en_US"), "en-US");
        assert_eq!(normalize_locale("zh-Hant-TW"), "zh-Hant-TW");
        assert_eq!(normalize_locale(""), "und");
    }

    #[test]
    fn test_empty_bundle() {
        let bundle = FingerprintBundle::empty();
        assert_eq!(bundle.uniqueness_estimate, 1);
        assert_eq!(bundle.entropy_bits, 0.0);
    }
}
