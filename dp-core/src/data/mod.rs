//! Observation model and composite snapshot types

mod snapshot;
mod types;

pub use snapshot::{FinalState, FingerprintExport, FullSnapshot, Quad, SnapshotParts};
pub use types::{
    AccuracyMode, AppInfo, BatteryHealth, BatterySnapshot, BatteryStatus, CodecInfo,
    DeviceIdentity, LocationFix, NetworkSnapshot, PublicNetSnapshot, SensorInfo, SourceKind,
    Transport,
};
