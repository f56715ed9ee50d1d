//! Installed-software inventory construction
//!
//! Platforms expose signer certificates in one of two shapes depending on
//! their API level. The shape is picked once with
//! [`select_signature_strategy`] and reused for every package.

use crate::constants::signature::SIGNING_INFO_API_LEVEL;
use crate::data::AppInfo;
use crate::error::Result;
use crate::fingerprint::{sha256_hex, validate_software_inventory};

/// Raw package record as enumerated by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRecord {
    pub package_name: String,
    pub version_name: Option<String>,
    pub version_code: i64,
    pub first_install_ms: u64,
    pub last_update_ms: u64,
    pub is_system: bool,
    /// Install location of the base archive, if known
    pub source_dir: Option<String>,
    /// Signers from the modern multi-signer record, first is primary
    pub signing_info: Option<Vec<Vec<u8>>>,
    /// Signatures from the legacy single-signer field
    pub legacy_signatures: Option<Vec<Vec<u8>>>,
}

/// Extracts the primary signer's certificate bytes from a record
pub trait SignatureStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Primary signer bytes; `None` when the record carries none
    fn signer_bytes<'a>(&self, record: &'a PackageRecord) -> Option<&'a [u8]>;
}

/// Reads the multi-signer signing info record
#[derive(Debug, Clone, Copy, Default)]
pub struct SigningInfoStrategy;

impl SignatureStrategy for SigningInfoStrategy {
    fn name(&self) -> &'static str {
        "signing-info"
    }

    fn signer_bytes<'a>(&self, record: &'a PackageRecord) -> Option<&'a [u8]> {
        record.signing_info.as_ref()?.first().map(Vec::as_slice)
    }
}

/// Reads the legacy signatures array
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySignatureStrategy;

impl SignatureStrategy for LegacySignatureStrategy {
    fn name(&self) -> &'static str {
        "legacy-signatures"
    }

    fn signer_bytes<'a>(&self, record: &'a PackageRecord) -> Option<&'a [u8]> {
        record.legacy_signatures.as_ref()?.first().map(Vec::as_slice)
    }
}

/// Pick the strategy for a platform API level
pub fn select_signature_strategy(api_level: u32) -> Box<dyn SignatureStrategy> {
    if api_level >= SIGNING_INFO_API_LEVEL {
        Box::new(SigningInfoStrategy)
    } else {
        Box::new(LegacySignatureStrategy)
    }
}

/// Installed through the store: base archive under the user app directory
fn installed_from_store(source_dir: Option<&str>) -> bool {
    source_dir.is_some_and(|dir| dir.contains("/data/app/") && dir.contains("/base.apk"))
}

/// Convert one record; a missing signer hashes as empty bytes
pub fn app_info_from_record(record: &PackageRecord, strategy: &dyn SignatureStrategy) -> AppInfo {
    let signer = strategy.signer_bytes(record).unwrap_or_default();
    let signature_digest = sha256_hex(signer);

    AppInfo {
        package_name: record.package_name.clone(),
        version_name: record.version_name.clone(),
        version_code: record.version_code,
        first_install_ms: record.first_install_ms,
        last_update_ms: record.last_update_ms,
        is_system: record.is_system,
        from_store: installed_from_store(record.source_dir.as_deref()),
        signature_digest,
    }
}

/// Build a validated inventory sorted by package identifier
pub fn build_inventory(records: &[PackageRecord], strategy: &dyn SignatureStrategy) -> Result<Vec<AppInfo>> {
    let mut apps: Vec<AppInfo> = records
        .iter()
        .map(|record| app_info_from_record(record, strategy))
        .collect();
    apps.sort_by(|a, b| a.package_name.cmp(&b.package_name));

    validate_software_inventory(&apps)?;
    Ok(apps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> PackageRecord {
        PackageRecord {
            package_name: name.to_string(),
            version_code: 7,
            source_dir: Some(format!("/data/app/{}-1/base.apk", name)),
            signing_info: Some(vec![b"modern".to_vec(), b"second".to_vec()]),
            legacy_signatures: Some(vec![b"legacy".to_vec()]),
            ..PackageRecord::default()
        }
    }

    #[test]
    fn test_strategy_selected_by_api_level() {
        assert_eq!(select_signature_strategy(28).name(), "signing-info");
        assert_eq!(select_signature_strategy(33).name(), "signing-info");
        assert_eq!(select_signature_strategy(27).name(), "legacy-signatures");
    }

    #[test]
    fn test_primary_signer_is_hashed() {
        let modern = app_info_from_record(&record("a.b"), &SigningInfoStrategy);
        assert_eq!(modern.signature_digest, sha256_hex(b"modern"));

        let legacy = app_info_from_record(&record("a.b"), &LegacySignatureStrategy);
        assert_eq!(legacy.signature_digest, sha256_hex(b"legacy"));
    }

    #[test]
    fn test_missing_signer_hashes_empty_bytes() {
        let bare = PackageRecord {
            package_name: "x.y".into(),
            ..PackageRecord::default()
        };
        let app = app_info_from_record(&bare, &SigningInfoStrategy);
        assert_eq!(app.signature_digest, sha256_hex(b""));
        assert!(!app.from_store);
    }

    #[test]
    fn test_store_heuristic() {
        assert!(installed_from_store(Some("/data/app/com.x-1/base.apk")));
        assert!(!installed_from_store(Some("/system/app/Foo/Foo.apk")));
        assert!(!installed_from_store(None));
    }

    #[test]
    fn test_inventory_sorted_and_validated() {
        let apps = build_inventory(&[record("z.y"), record("a.b")], &SigningInfoStrategy).unwrap();
        assert_eq!(apps[0].package_name, "a.b");
        assert_eq!(apps[1].package_name, "z.y");

        let broken = PackageRecord::default();
        assert!(build_inventory(&[broken], &SigningInfoStrategy).is_err());
    }
}
