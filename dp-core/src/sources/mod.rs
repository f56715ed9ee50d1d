//! Source adapters owned by the core
//!
//! Concrete observation sources live with the host integration; this module
//! holds the pieces every host shares:
//! - `public_ip` - periodic public address resolution with retry
//! - `queries` - synchronous location point-queries used by Stage-2
//! - `packages` - software inventory construction and signature strategy

pub mod packages;
pub mod public_ip;
pub mod queries;

pub use packages::{
    app_info_from_record, build_inventory, select_signature_strategy, LegacySignatureStrategy,
    PackageRecord, SignatureStrategy, SigningInfoStrategy,
};
pub use public_ip::{parse_ip_response, HttpIpEndpoint, IpEndpoint, PublicIpResolver, ResolverSchedule};
pub use queries::{LocationQueries, NoLocationQueries};

#[cfg(test)]
pub use queries::MockLocationQueries;
