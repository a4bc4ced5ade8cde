//! Unique identifiers for history and activity entries.
//!
//! Ids take the form `<prefix>-<token>`, where the token is the first
//! [`TOKEN_LEN`] hex characters of a BLAKE3 hash over the prefix, the
//! wall-clock time in nanoseconds, the process id and a process-wide
//! sequence number. The sequence number alone guarantees uniqueness within a
//! process; the clock and pid spread ids across processes sharing a data file.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Prefix for generic history entries.
pub const HISTORY_PREFIX: &str = "hist";
/// Prefix for assignment history entries.
pub const ASSIGNMENT_PREFIX: &str = "asg";
/// Prefix for state history entries.
pub const STATE_PREFIX: &str = "est";
/// Prefix for activity log entries.
pub const ACTIVITY_PREFIX: &str = "act";

/// Number of hex characters kept from the hash.
pub const TOKEN_LEN: usize = 16;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh id with the given prefix.
#[must_use]
pub fn next_id(prefix: &str) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let hash_input = format!("{prefix}\t{nanos}\t{}\t{seq}\n", std::process::id());
    let hash = blake3::hash(hash_input.as_bytes()).to_hex();
    format!("{prefix}-{}", &hash[..TOKEN_LEN])
}
