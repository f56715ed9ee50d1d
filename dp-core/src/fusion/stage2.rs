//! Stage-2: Stage-1 quad plus inventories and location point-queries

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::warn;

use super::Stage;
use crate::data::{
    AccuracyMode, AppInfo, CodecInfo, DeviceIdentity, FullSnapshot, Quad, SensorInfo,
    SnapshotParts, SourceKind,
};
use crate::error::Result;
use crate::fingerprint::validate_software_inventory;
use crate::sources::LocationQueries;
use crate::stream::{SlotReader, StateStream};

pub struct Stage2 {
    device: DeviceIdentity,
    quad: SlotReader<Quad>,
    sensors: SlotReader<Vec<SensorInfo>>,
    codecs: SlotReader<Vec<CodecInfo>>,
    apps: SlotReader<Vec<AppInfo>>,
    /// Last inventory that passed validation
    software: Vec<AppInfo>,
    queries: Arc<dyn LocationQueries>,
    refresh: Arc<Notify>,
}

impl Stage2 {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: DeviceIdentity,
        quad: &StateStream<Quad>,
        sensors: &StateStream<Vec<SensorInfo>>,
        codecs: &StateStream<Vec<CodecInfo>>,
        apps: &StateStream<Vec<AppInfo>>,
        queries: Arc<dyn LocationQueries>,
        refresh: Arc<Notify>,
    ) -> Self {
        let mut stage = Self {
            device,
            quad: SlotReader::from_stage("stage-1", quad),
            sensors: SlotReader::new(SourceKind::Sensors, sensors),
            codecs: SlotReader::new(SourceKind::Codecs, codecs),
            apps: SlotReader::new(SourceKind::Software, apps),
            software: Vec::new(),
            queries,
            refresh,
        };
        stage.accept_software();
        stage
    }

    /// Take the software slot's latest list if it validates.
    ///
    /// A rejected list leaves the previous one (and so its digest) in place;
    /// the other slots keep recombining normally.
    fn accept_software(&mut self) {
        let latest = self.apps.value();
        if *latest == self.software {
            return;
        }
        match validate_software_inventory(latest) {
            Ok(()) => self.software = latest.clone(),
            Err(e) => warn!(
                "Ignoring software inventory update, keeping {} previous records: {}",
                self.software.len(),
                e
            ),
        }
    }

    fn terminated(&self) -> Vec<SourceKind> {
        [
            (self.sensors.kind(), self.sensors.is_terminated()),
            (self.codecs.kind(), self.codecs.is_terminated()),
            (self.apps.kind(), self.apps.is_terminated()),
        ]
        .into_iter()
        .filter_map(|(kind, dead)| if dead { kind } else { None })
        .collect()
    }

    fn parts(&self, apps: Vec<AppInfo>, accuracy: AccuracyMode, holders: Vec<String>) -> SnapshotParts {
        SnapshotParts {
            device: self.device.clone(),
            quad: self.quad.value().clone(),
            sensors: self.sensors.value().clone(),
            codecs: self.codecs.value().clone(),
            apps,
            accuracy,
            mock_location_holders: holders,
            terminated: self.terminated(),
        }
    }
}

#[async_trait]
impl Stage for Stage2 {
    type Output = FullSnapshot;

    fn name(&self) -> &'static str {
        "stage-2"
    }

    async fn changed(&mut self) {
        let software_changed = tokio::select! {
            _ = self.quad.changed() => false,
            _ = self.sensors.changed() => false,
            _ = self.codecs.changed() => false,
            _ = self.apps.changed() => true,
            _ = self.refresh.notified() => false,
        };
        if software_changed {
            self.accept_software();
        }
    }

    /// The point-queries are asked exactly once per call
    fn combine(&self) -> Result<FullSnapshot> {
        let accuracy = self.queries.accuracy_mode();
        let holders = self.queries.mock_location_holders();

        Ok(FullSnapshot::from_parts(self.parts(self.software.clone(), accuracy, holders)))
    }

    /// Current slots with default point-query answers
    fn fallback(&self) -> FullSnapshot {
        FullSnapshot::from_parts(self.parts(self.software.clone(), AccuracyMode::default(), Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockLocationQueries;

    fn stage_with(apps: Vec<AppInfo>, queries: MockLocationQueries) -> (Stage2, StateStream<Vec<AppInfo>>) {
        let quad = StateStream::new(Quad::default());
        let sensors = StateStream::new(Vec::new());
        let codecs = StateStream::new(Vec::new());
        let apps = StateStream::new(apps);
        let stage = Stage2::new(
            DeviceIdentity::new("Acme", "Rocket", "en-US"),
            &quad,
            &sensors,
            &codecs,
            &apps,
            Arc::new(queries),
            Arc::new(Notify::new()),
        );
        (stage, apps)
    }

    #[test]
    fn test_queries_evaluated_once_per_combine() {
        let mut queries = MockLocationQueries::new();
        queries
            .expect_accuracy_mode()
            .times(2)
            .return_const(AccuracyMode::HighAccuracy);
        queries
            .expect_mock_location_holders()
            .times(2)
            .returning(|| vec!["b.fake".into(), "a.fake".into(), "b.fake".into()]);

        let (stage, _apps) = stage_with(vec![AppInfo::new("a.b", "11")], queries);
        let first = stage.combine().unwrap();
        let second = stage.combine().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.accuracy, AccuracyMode::HighAccuracy);
        assert_eq!(first.mock_location_holders, vec!["a.fake", "b.fake"]);
    }

    #[test]
    fn test_digest_matches_list() {
        let mut queries = MockLocationQueries::new();
        queries.expect_accuracy_mode().return_const(AccuracyMode::Off);
        queries.expect_mock_location_holders().returning(Vec::new);

        let apps = vec![AppInfo::new("z.y", "22"), AppInfo::new("a.b", "11")];
        let (stage, _apps) = stage_with(apps, queries);
        let snapshot = stage.combine().unwrap();
        assert_eq!(snapshot.apps_digest(), crate::fingerprint::apps_digest(snapshot.apps()));
    }

    #[test]
    fn test_malformed_initial_inventory_starts_empty() {
        let mut queries = MockLocationQueries::new();
        queries.expect_accuracy_mode().times(1).return_const(AccuracyMode::Off);
        queries.expect_mock_location_holders().times(1).returning(Vec::new);

        let (stage, _apps) = stage_with(vec![AppInfo::new("", "11")], queries);
        let snapshot = stage.combine().unwrap();
        assert!(snapshot.apps().is_empty());
        assert_eq!(snapshot.apps_digest(), crate::fingerprint::apps_digest(&[]));
    }

    #[tokio::test]
    async fn test_rejected_inventory_keeps_previous_list() {
        let mut queries = MockLocationQueries::new();
        queries.expect_accuracy_mode().return_const(AccuracyMode::Off);
        queries.expect_mock_location_holders().returning(Vec::new);

        let good = vec![AppInfo::new("a.b", "SIG-opaque")];
        let (mut stage, apps) = stage_with(good.clone(), queries);

        apps.publish(vec![AppInfo::new("  ", "11")]);
        stage.changed().await;
        let snapshot = stage.combine().unwrap();
        assert_eq!(snapshot.apps(), good.as_slice());
        assert_eq!(snapshot.apps_digest(), crate::fingerprint::apps_digest(&good));

        let next = vec![AppInfo::new("a.b", "SIG-opaque"), AppInfo::new("c.d", "22")];
        apps.publish(next.clone());
        stage.changed().await;
        assert_eq!(stage.combine().unwrap().apps(), next.as_slice());
    }
}
