//! The three stages wired together

use std::fmt;
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use super::{spawn_stage, Stage1, Stage2, Stage3};
use crate::data::{
    AppInfo, BatterySnapshot, CodecInfo, DeviceIdentity, FinalState, FullSnapshot, LocationFix,
    NetworkSnapshot, PublicNetSnapshot, Quad, SensorInfo,
};
use crate::fingerprint::{global_frequency_table, EntropyModel, FrequencyTable};
use crate::settings::Settings;
use crate::sources::LocationQueries;
use crate::stream::{StateStream, StateView, Subscription};

/// Every input the pipeline fuses.
///
/// The pipeline takes ownership of these handles and releases them when it
/// is dropped; a source whose last handle this was is torn down with it.
pub struct PipelineSources {
    pub device: DeviceIdentity,
    pub location: StateStream<Option<LocationFix>>,
    pub network: StateStream<NetworkSnapshot>,
    pub public_net: StateStream<Option<PublicNetSnapshot>>,
    pub battery: StateStream<BatterySnapshot>,
    pub sensors: StateStream<Vec<SensorInfo>>,
    pub codecs: StateStream<Vec<CodecInfo>>,
    pub apps: StateStream<Vec<AppInfo>>,
    pub queries: Arc<dyn LocationQueries>,
}

impl PipelineSources {
    /// Sources that never publish: every slot holds its default value
    pub fn idle(device: DeviceIdentity, queries: Arc<dyn LocationQueries>) -> Self {
        Self {
            device,
            location: StateStream::new(None),
            network: StateStream::new(NetworkSnapshot::default()),
            public_net: StateStream::new(None),
            battery: StateStream::new(BatterySnapshot::default()),
            sensors: StateStream::new(Vec::new()),
            codecs: StateStream::new(Vec::new()),
            apps: StateStream::new(Vec::new()),
            queries,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Reference table; the process-wide table when `None`
    pub frequency_table: Option<Arc<FrequencyTable>>,
    pub entropy_model: EntropyModel,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            frequency_table: None,
            entropy_model: settings.fingerprint.entropy_model,
        }
    }

    pub fn with_table(mut self, table: Arc<FrequencyTable>) -> Self {
        self.frequency_table = Some(table);
        self
    }
}

/// Running fusion pipeline.
///
/// Stages start eagerly in [`Pipeline::start`] and keep running whether or
/// not anyone is subscribed. Dropping the pipeline stops every stage and
/// releases every upstream subscription.
pub struct Pipeline {
    sources: Option<PipelineSources>,
    quads: StateStream<Quad>,
    snapshots: StateStream<FullSnapshot>,
    state: StateStream<FinalState>,
    refresh: Arc<Notify>,
    tasks: Vec<JoinHandle<()>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("running", &self.is_running())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Pipeline {
    /// Wire and start all three stages.
    ///
    /// Must be called from within a tokio runtime. The final state is
    /// available as soon as this returns.
    pub fn start(sources: PipelineSources, options: PipelineOptions) -> Self {
        let table = options.frequency_table.unwrap_or_else(global_frequency_table);
        let refresh = Arc::new(Notify::new());

        let (quads, stage1) = spawn_stage(Stage1::new(
            &sources.location,
            &sources.network,
            &sources.public_net,
            &sources.battery,
        ));

        let (snapshots, stage2) = spawn_stage(Stage2::new(
            sources.device.clone(),
            &quads,
            &sources.sensors,
            &sources.codecs,
            &sources.apps,
            Arc::clone(&sources.queries),
            Arc::clone(&refresh),
        ));

        let (state, stage3) = spawn_stage(Stage3::new(&snapshots, table, options.entropy_model));

        info!("Fusion pipeline started ({:?} entropy)", options.entropy_model);

        Self {
            sources: Some(sources),
            quads,
            snapshots,
            state,
            refresh,
            tasks: vec![stage1, stage2, stage3],
        }
    }

    /// The final state stream
    pub fn state(&self) -> StateView<FinalState> {
        self.state.view()
    }

    /// Latest final state
    pub fn current(&self) -> Option<FinalState> {
        self.state.value()
    }

    pub fn subscribe(&self) -> Subscription<FinalState> {
        self.state.subscribe()
    }

    /// Stage-2 output
    pub fn full_snapshots(&self) -> StateView<FullSnapshot> {
        self.snapshots.view()
    }

    /// Stage-1 output
    pub fn stage1(&self) -> StateView<Quad> {
        self.quads.view()
    }

    /// Recombine Stage-2 now, re-asking the point-queries
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.sources.is_some() && self.tasks.iter().any(|t| !t.is_finished())
    }

    /// Stop every stage and release the sources
    pub fn shutdown(&mut self) {
        if self.sources.is_none() {
            return;
        }
        for task in &self.tasks {
            task.abort();
        }
        self.sources = None;
        info!("Fusion pipeline stopped");
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
