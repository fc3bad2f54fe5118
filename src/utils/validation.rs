// file: src/utils/validation.rs
// version: 2.0.0
// guid: 19464dc9-bd0a-4839-9583-35406bb08e6a

//! Address and name validation for node configuration.
//!
//! Everything here is pure: no I/O, no probing. Internal and storage addresses
//! follow the `10.0.x.0/24` convention, where `x` selects the segment and the
//! host octet is copied from the management address.

use crate::{InstallerError, Result};
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

/// Third octet of the management segment
pub const MANAGEMENT_OCTET: u8 = 0;
/// Third octet of the internal (tenant overlay) segment
pub const INTERNAL_OCTET: u8 = 1;
/// Third octet of the storage segment
pub const STORAGE_OCTET: u8 = 2;

/// True iff `value` is four dot-separated decimal octets in [0, 255].
///
/// Zero-padded octets ("010") are read as decimal. Surrounding whitespace and
/// trailing garbage are rejected.
pub fn validate_ipv4(value: &str) -> bool {
    octets(value).is_some()
}

fn octets(value: &str) -> Option<[u8; 4]> {
    let mut result = [0u8; 4];
    let mut parts = value.split('.');
    for slot in result.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse::<u8>().ok()?;
    }
    match parts.next() {
        Some(_) => None,
        None => Some(result),
    }
}

/// True iff `value` is a valid IPv4 address followed by `/` and a prefix length in [0, 32]
pub fn validate_cidr(value: &str) -> bool {
    let Some((address, prefix)) = value.split_once('/') else {
        return false;
    };

    if !validate_ipv4(address) {
        return false;
    }

    if prefix.is_empty() || prefix.len() > 2 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    prefix.parse::<u8>().map(|p| p <= 32).unwrap_or(false)
}

/// Parse an IPv4 address, returning a validation error naming the field
pub fn parse_ipv4(field: &str, value: &str) -> Result<Ipv4Addr> {
    octets(value.trim()).map(Ipv4Addr::from).ok_or_else(|| {
        InstallerError::validation(format!("{} '{}' is not a valid IPv4 address", field, value))
    })
}

/// Derive a segment address from the management address.
///
/// The result is always `10.0.<third_octet>.<host>` where `host` is the fourth
/// octet of `management`. This is a numbering convention, not a subnet
/// computation, so two nodes may derive the same address; callers that need a
/// different value store an explicit override.
pub fn derive_address(management: Ipv4Addr, third_octet: u8) -> Ipv4Addr {
    let host = management.octets()[3];
    Ipv4Addr::new(10, 0, third_octet, host)
}

/// True iff the string looks like a Linux interface name (at most 15 bytes)
pub fn validate_interface_name(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:@-]{0,14}$").ok());

    match pattern {
        Some(re) => re.is_match(name) && name != "." && name != "..",
        None => false,
    }
}

/// True iff `name` is an RFC 1123 hostname: one or more dot-separated labels
/// of letters, digits and inner hyphens, each at most 63 bytes, 253 in total
pub fn validate_hostname(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$").ok()
    });

    match pattern {
        Some(re) => name.len() <= 253 && re.is_match(name),
        None => false,
    }
}

/// True iff the string is a bare block device name such as `sdb` or `nvme1n1`
pub fn validate_disk_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 32
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && name.bytes().next().map(|b| b.is_ascii_lowercase()).unwrap_or(false)
}
