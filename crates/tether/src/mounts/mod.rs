//! Execution-ready mounts.
//!
//! This module handles:
//! - The `{source, destination, writable}` record handed to the execution backend
//! - Deterministic ordering of those records
//! - Assembling them from a container's mount points
//! - Conversion into OCI runtime-spec mounts

mod assemble;
pub mod oci;

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use assemble::{MountAssembler, resolve_source};
pub use oci::{OciMount, to_oci_mounts};

/// A resolved bind mount, ready for the execution backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mount {
    /// Host-side path. Never empty.
    pub source: PathBuf,
    /// Path inside the container.
    pub destination: PathBuf,
    /// Mounted read-write.
    pub writable: bool,
}

/// Order mounts by destination, then source.
///
/// Both comparisons are byte-wise on the raw path string, not per path
/// component, so `/a-b` sorts before `/a/b`.
#[must_use]
pub fn compare_mounts(a: &Mount, b: &Mount) -> Ordering {
    a.destination
        .as_os_str()
        .cmp(b.destination.as_os_str())
        .then_with(|| a.source.as_os_str().cmp(b.source.as_os_str()))
        .then_with(|| a.writable.cmp(&b.writable))
}

// `PathBuf` equality is per component (`/a/` == `/a`); these must agree
// with the byte-wise order instead.
impl PartialEq for Mount {
    fn eq(&self, other: &Self) -> bool {
        compare_mounts(self, other).is_eq()
    }
}

impl Eq for Mount {}

impl Hash for Mount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.as_os_str().hash(state);
        self.destination.as_os_str().hash(state);
        self.writable.hash(state);
    }
}

impl Ord for Mount {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_mounts(self, other)
    }
}

impl PartialOrd for Mount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
