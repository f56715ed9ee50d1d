//! devprint Core Library
//!
//! Continuously fuses independently updating host observations into one
//! consistent snapshot and derives a stable device fingerprint from it.
//!
//! # Features
//!
//! - **State Streams**: replay-latest multicast value sources with conflation
//! - **Three-stage Fusion**: recomputes on any upstream change, isolates failed
//!   recombinations and keeps serving the previous value
//! - **Fingerprint**: nine canonical fields, compact JSON, SHA-256
//! - **Entropy Estimate**: per-field lookup in a reference frequency table
//! - **Public Address Resolver**: endpoint fallback with refresh and retry timers
//!
//! # Module Structure
//!
//! - `stream/` - State stream contract and slot adapters
//! - `data/` - Observation model and composite snapshots
//! - `fingerprint/` - Digest, assembler, entropy, frequency table
//! - `fusion/` - Stage-1/2/3 combiners and the pipeline
//! - `sources/` - Public address resolver, point-queries, signature strategy
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dp_core::{DeviceIdentity, NoLocationQueries, Pipeline, PipelineOptions, PipelineSources};
//!
//! # async fn run() {
//! let device = DeviceIdentity::new("Acme", "Rocket 3", "en-US");
//! let sources = PipelineSources::idle(device, Arc::new(NoLocationQueries));
//! let pipeline = Pipeline::start(sources, PipelineOptions::default());
//!
//! if let Some(state) = pipeline.current() {
//!     println!("{}", state.fingerprint.digest_hex);
//! }
//! # }
//! ```

// Grouped modules
pub mod data;
pub mod fingerprint;
pub mod fusion;
pub mod sources;
pub mod stream;

// Standalone modules
pub mod constants;
pub mod error;
pub mod settings;

// Re-export primary types from data/
pub use data::{
    AccuracyMode, AppInfo, BatteryHealth, BatterySnapshot, BatteryStatus, CodecInfo,
    DeviceIdentity, FinalState, FingerprintExport, FullSnapshot, LocationFix, NetworkSnapshot,
    PublicNetSnapshot, Quad, SensorInfo, SnapshotParts, SourceKind, Transport,
};

// Re-export error types
pub use error::{DevprintError, Result};

// Re-export fingerprint functions
pub use fingerprint::{
    apps_digest, assemble, assemble_with, estimate_entropy, global_frequency_table, sha256_hex,
    uniqueness_from_bits, CanonicalFields, EntropyEstimate, EntropyModel, FingerprintBundle,
    FrequencyTable,
};

// Re-export fusion types
pub use fusion::{Pipeline, PipelineOptions, PipelineSources};

// Re-export sources
pub use sources::{
    build_inventory, select_signature_strategy, IpEndpoint,
    LocationQueries, NoLocationQueries, PackageRecord, PublicIpResolver, ResolverSchedule,
    SignatureStrategy,
};

// Re-export stream types
pub use stream::{Absent, Emitter, Registration, Slot, StateStream, StateView, Subscription};

// Re-export settings
pub use settings::{get_cached_settings, load_settings, load_settings_from, Settings};
