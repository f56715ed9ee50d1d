//! Installed-software digest
//!
//! Reduces the software inventory to one SHA-256 that does not depend on
//! enumeration order.

use sha2::{Digest, Sha256};

use crate::data::AppInfo;
use crate::error::{DevprintError, Result};

/// Digest of an installed-software list.
///
/// Records are ordered by `(package_name, signature_digest)` and their
/// signature digests fed, in that order, into a single SHA-256. Two lists
/// holding the same pairs produce the same digest whatever their order.
/// An empty list yields the digest of empty input.
pub fn apps_digest(apps: &[AppInfo]) -> String {
    let mut sorted: Vec<&AppInfo> = apps.iter().collect();
    sorted.sort_by(|a, b| {
        a.package_name
            .cmp(&b.package_name)
            .then_with(|| a.signature_digest.cmp(&b.signature_digest))
    });

    let mut hasher = Sha256::new();
    for app in sorted {
        hasher.update(app.signature_digest.as_bytes());
    }
    to_hex(&hasher.finalize())
}

/// Lowercase hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    to_hex(&Sha256::digest(bytes))
}

/// Reject inventories whose records cannot be ordered by package id.
///
/// Signature digests are opaque content identities and are not checked.
pub fn validate_software_inventory(apps: &[AppInfo]) -> Result<()> {
    for (index, app) in apps.iter().enumerate() {
        if app.package_name.trim().is_empty() {
            return Err(DevprintError::malformed(
                "software",
                format!("empty package id at index {}", index),
            ));
        }
    }
    Ok(())
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_digest_is_order_independent() {
        let forward = vec![AppInfo::new("a.b", "11"), AppInfo::new("z.y", "22")];
        let reverse = vec![AppInfo::new("z.y", "22"), AppInfo::new("a.b", "11")];
        assert_eq!(apps_digest(&forward), apps_digest(&reverse));
    }

    #[test]
    fn test_digest_feeds_signatures_in_package_order() {
        let apps = vec![AppInfo::new("z.y", "22"), AppInfo::new("a.b", "11")];
        // sha256("1122")
        assert_eq!(
            apps_digest(&apps),
            "b3282a2f2a28757b3a18ab833de16a9c54518c0b0cf493e3f0a7cf09386f326a"
        );
    }

    #[test]
    fn test_duplicate_package_ids_are_order_independent() {
        let one = vec![AppInfo::new("a.b", "aa"), AppInfo::new("a.b", "bb")];
        let two = vec![AppInfo::new("a.b", "bb"), AppInfo::new("a.b", "aa")];
        assert_eq!(apps_digest(&one), apps_digest(&two));
    }

    #[test]
    fn test_empty_digest() {
        assert_eq!(apps_digest(&[]), EMPTY_SHA256);
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_validate_inventory() {
        assert!(validate_software_inventory(&[AppInfo::new("a.b", "0f")]).is_ok());
        assert!(validate_software_inventory(&[AppInfo::new("  ", "0f")]).is_err());
        // any signature text is accepted
        assert!(validate_software_inventory(&[AppInfo::new("a.b", "SIG-not-hex")]).is_ok());
        assert!(validate_software_inventory(&[AppInfo::new("a.b", "")]).is_ok());
    }
}
