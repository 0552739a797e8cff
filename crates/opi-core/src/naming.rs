//! Deterministic resource names derived from app names.
//!
//! Stable and headless services live in separate prefix families (`cf-` vs `cfh-`); no name in
//! one family can be produced by the other. Names that would exceed the DNS label limit are
//! truncated and suffixed with a digest of the full app name.
use sha2::{Digest, Sha256};

const SERVICE_PREFIX: &str = "cf-";
const HEADLESS_SERVICE_PREFIX: &str = "cfh-";

/// Maximum length of a DNS-1123 label.
pub const MAX_NAME_LEN: usize = 63;

/// Number of digest bytes appended to truncated names (rendered as hex).
const DIGEST_BYTES: usize = 5;

/// Name of the stable service for `app_name`.
pub fn service_name(app_name: &str) -> String {
    bounded(SERVICE_PREFIX, app_name)
}

/// Name of the headless service for `app_name`.
pub fn headless_service_name(app_name: &str) -> String {
    bounded(HEADLESS_SERVICE_PREFIX, app_name)
}

/// Whether `name` is a DNS-1123 label: at most 63 lowercase alphanumerics or `-`, starting and
/// ending with an alphanumeric.
pub fn is_dns_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    let edge_ok = |b: Option<&u8>| b.is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit());

    name.len() <= MAX_NAME_LEN
        && edge_ok(bytes.first())
        && edge_ok(bytes.last())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

fn bounded(prefix: &str, app_name: &str) -> String {
    let full = format!("{prefix}{app_name}");
    if full.len() <= MAX_NAME_LEN {
        return full;
    }

    let digest = Sha256::digest(app_name.as_bytes());
    let suffix: String = digest
        .iter()
        .take(DIGEST_BYTES)
        .map(|b| format!("{b:02x}"))
        .collect();

    let keep = MAX_NAME_LEN - prefix.len() - 1 - suffix.len();
    let head: String = app_name.chars().take(keep).collect();
    format!("{prefix}{}-{suffix}", head.trim_end_matches('-'))
}
