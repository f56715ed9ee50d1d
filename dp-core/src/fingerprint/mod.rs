//! Fingerprint assembly and uniqueness estimation
//!
//! # Pipeline
//!
//! 1. `digest` - order-independent digest of the installed-software list
//! 2. `assembler` - nine canonical fields -> compact JSON -> SHA-256
//! 3. `entropy` - per-field lookup in the reference table -> bits and
//!    uniqueness estimate
//! 4. `frequency` - the reference table, parsed once per process
//!
//! Everything here is a pure function of its inputs.

mod assembler;
mod digest;
mod entropy;
mod frequency;

pub use assembler::{assemble, assemble_with, CanonicalFields, FingerprintBundle};
pub use digest::{apps_digest, sha256_hex, validate_software_inventory};
pub use entropy::{
    estimate_entropy, uniqueness_from_bits, EntropyEstimate, EntropyModel, FieldContribution,
};
pub use frequency::{global_frequency_table, FrequencyTable};
