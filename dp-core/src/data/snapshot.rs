//! Composite values produced by the fusion stages
//!
//! Every value here is rebuilt from scratch on each recombination and never
//! mutated afterwards.

use serde::Serialize;

use super::types::*;
use crate::fingerprint::{apps_digest, FingerprintBundle};
use crate::stream::Absent;

/// Stage-1 composite: latest location, local network, public network and battery
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Quad {
    pub location: Option<LocationFix>,
    pub network: NetworkSnapshot,
    pub public_net: Option<PublicNetSnapshot>,
    pub battery: BatterySnapshot,
    /// Slots whose upstream terminated; they hold their absent value
    pub terminated: Vec<SourceKind>,
}

impl Absent for Quad {
    fn absent() -> Self {
        Self::default()
    }
}

/// Everything Stage-2 combines into one [`FullSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct SnapshotParts {
    pub device: DeviceIdentity,
    pub quad: Quad,
    pub sensors: Vec<SensorInfo>,
    pub codecs: Vec<CodecInfo>,
    pub apps: Vec<AppInfo>,
    pub accuracy: AccuracyMode,
    pub mock_location_holders: Vec<String>,
    /// Stage-2 slots whose upstream terminated
    pub terminated: Vec<SourceKind>,
}

/// Stage-2 composite.
///
/// The software list and its digest are private so they can only change
/// together: `apps_digest() == fingerprint::apps_digest(apps())` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullSnapshot {
    pub device: DeviceIdentity,
    pub location: Option<LocationFix>,
    pub network: NetworkSnapshot,
    pub public_net: Option<PublicNetSnapshot>,
    pub battery: BatterySnapshot,
    pub sensors: Vec<SensorInfo>,
    pub codecs: Vec<CodecInfo>,
    apps: Vec<AppInfo>,
    apps_digest: String,
    pub accuracy: AccuracyMode,
    /// Packages holding the mock-location privilege, sorted and deduplicated
    pub mock_location_holders: Vec<String>,
    /// Sources that ended with a terminal error, sorted
    pub terminated: Vec<SourceKind>,
}

impl FullSnapshot {
    pub fn from_parts(parts: SnapshotParts) -> Self {
        let SnapshotParts {
            device,
            quad,
            sensors,
            codecs,
            apps,
            accuracy,
            mut mock_location_holders,
            terminated,
        } = parts;

        mock_location_holders.sort();
        mock_location_holders.dedup();

        let mut all_terminated = quad.terminated;
        all_terminated.extend(terminated);
        all_terminated.sort();
        all_terminated.dedup();

        let digest = apps_digest(&apps);

        Self {
            device,
            location: quad.location,
            network: quad.network,
            public_net: quad.public_net,
            battery: quad.battery,
            sensors,
            codecs,
            apps,
            apps_digest: digest,
            accuracy,
            mock_location_holders,
            terminated: all_terminated,
        }
    }

    pub fn apps(&self) -> &[AppInfo] {
        &self.apps
    }

    pub fn apps_digest(&self) -> &str {
        &self.apps_digest
    }

    pub fn is_terminated(&self, kind: SourceKind) -> bool {
        self.terminated.contains(&kind)
    }
}

impl Absent for FullSnapshot {
    fn absent() -> Self {
        Self::from_parts(SnapshotParts::default())
    }
}

/// Canonical text and digest, as handed to "share fingerprint"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintExport {
    pub canonical_text: String,
    pub digest_hex: String,
}

/// Stage-3 output: the full snapshot with its fingerprint attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalState {
    #[serde(flatten)]
    pub snapshot: FullSnapshot,
    pub fingerprint: FingerprintBundle,
}

impl FinalState {
    pub fn export(&self) -> FingerprintExport {
        FingerprintExport {
            canonical_text: self.fingerprint.canonical_text.clone(),
            digest_hex: self.fingerprint.digest_hex.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with_apps(apps: Vec<AppInfo>) -> SnapshotParts {
        SnapshotParts {
            device: DeviceIdentity::new("Acme", "Rocket 3", "en-US"),
            quad: Quad::default(),
            sensors: Vec::new(),
            codecs: Vec::new(),
            apps,
            accuracy: AccuracyMode::Off,
            mock_location_holders: vec!["z.mock".into(), "a.mock".into(), "z.mock".into()],
            terminated: vec![SourceKind::Software],
        }
    }

    #[test]
    fn test_digest_matches_list() {
        let apps = vec![AppInfo::new("z.y", "22"), AppInfo::new("a.b", "11")];
        let snapshot = FullSnapshot::from_parts(parts_with_apps(apps.clone()));
        assert_eq!(snapshot.apps(), apps.as_slice());
        assert_eq!(snapshot.apps_digest(), apps_digest(&apps));
    }

    #[test]
    fn test_holders_and_terminated_normalized() {
        let mut parts = parts_with_apps(Vec::new());
        parts.quad.terminated = vec![SourceKind::Network, SourceKind::Location];
        let snapshot = FullSnapshot::from_parts(parts);
        assert_eq!(snapshot.mock_location_holders, vec!["a.mock", "z.mock"]);
        assert_eq!(
            snapshot.terminated,
            vec![SourceKind::Location, SourceKind::Network, SourceKind::Software]
        );
        assert!(snapshot.is_terminated(SourceKind::Network));
        assert!(!snapshot.is_terminated(SourceKind::Battery));
    }
}
