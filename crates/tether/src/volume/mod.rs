//! Volumes and container mount points.
//!
//! A [`MountPoint`] is a container's declared intent to mount something at a
//! destination. It either names an explicit host source (a raw bind) or
//! carries a [`Volume`] handle whose host path becomes available once a
//! [`VolumeEnsurer`] has initialized it.

mod bind;
mod ensurer;
mod normalize;
mod store;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tether_common::{ContainerId, TetherError, TetherResult};

pub use bind::{BindSource, BindSpec};
pub use ensurer::VolumeEnsurer;
pub use normalize::{BindModeNormalizer, LabelingDefaults, PassThrough, platform_normalizer};
pub use store::{VolumeInfo, VolumeStore};

/// Driver name of directory-backed volumes.
pub const LOCAL_DRIVER: &str = "local";

/// A managed, driver-backed storage unit.
///
/// Only the volume subsystem mutates a volume. Everything else reads its
/// path after an ensurer has returned successfully.
pub trait Volume: Send + Sync + fmt::Debug {
    /// Volume name.
    fn name(&self) -> &str;

    /// Driver backing this volume.
    fn driver(&self) -> &str;

    /// Host-side path, once initialized.
    fn path(&self) -> Option<PathBuf>;
}

/// Volume handle issued by a [`VolumeStore`].
#[derive(Debug)]
pub struct LocalVolume {
    name: String,
    path: RwLock<Option<PathBuf>>,
    refs: RwLock<BTreeSet<ContainerId>>,
}

impl LocalVolume {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: RwLock::new(None),
            refs: RwLock::new(BTreeSet::new()),
        }
    }

    pub(crate) fn initialized(name: impl Into<String>, path: PathBuf) -> Self {
        let volume = Self::new(name);
        *volume.path.write() = Some(path);
        volume
    }

    /// Whether the data directory has been created.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.path.read().is_some()
    }

    pub(crate) fn set_path(&self, path: PathBuf) {
        *self.path.write() = Some(path);
    }

    pub(crate) fn add_ref(&self, container_id: &ContainerId) -> bool {
        self.refs.write().insert(container_id.clone())
    }

    pub(crate) fn remove_ref(&self, container_id: &ContainerId) -> bool {
        self.refs.write().remove(container_id)
    }

    /// Containers currently referencing this volume, sorted.
    #[must_use]
    pub fn refs(&self) -> Vec<ContainerId> {
        self.refs.read().iter().cloned().collect()
    }
}

impl Volume for LocalVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver(&self) -> &str {
        LOCAL_DRIVER
    }

    fn path(&self) -> Option<PathBuf> {
        self.path.read().clone()
    }
}

/// Check that a volume name is usable as a single directory component.
///
/// # Errors
///
/// Returns [`TetherError::InvalidVolumeName`] otherwise.
pub fn validate_volume_name(name: &str) -> TetherResult<()> {
    let valid = name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        Err(TetherError::InvalidVolumeName {
            name: name.to_string(),
        })
    }
}

/// Mount propagation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    /// No propagation in either direction.
    Private,
    /// Recursive private.
    RPrivate,
    /// Events propagate both ways.
    Shared,
    /// Recursive shared.
    RShared,
    /// Receive events from the host only.
    Slave,
    /// Recursive slave.
    RSlave,
}

impl Propagation {
    /// Mount option name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::RPrivate => "rprivate",
            Self::Shared => "shared",
            Self::RShared => "rshared",
            Self::Slave => "slave",
            Self::RSlave => "rslave",
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Propagation {
    type Err = TetherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "rprivate" => Ok(Self::RPrivate),
            "shared" => Ok(Self::Shared),
            "rshared" => Ok(Self::RShared),
            "slave" => Ok(Self::Slave),
            "rslave" => Ok(Self::RSlave),
            other => Err(TetherError::Config {
                message: format!("unknown mount propagation '{other}'"),
            }),
        }
    }
}

/// A container's declared mount.
#[derive(Debug, Clone)]
pub struct MountPoint {
    /// Logical name (the volume name for managed volumes).
    pub name: String,
    /// Volume driver; empty for raw binds.
    pub driver: String,
    /// Explicit host-side source.
    pub source: Option<PathBuf>,
    /// Path inside the container.
    pub destination: PathBuf,
    /// Mounted read-write.
    pub rw: bool,
    /// Raw mode options as written by the user, e.g. `z` or `ro`.
    pub mode: String,
    /// Propagation mode, if any was requested or defaulted.
    pub propagation: Option<Propagation>,
    /// Backing volume; `None` for raw binds.
    pub volume: Option<Arc<dyn Volume>>,
}

impl MountPoint {
    /// A raw bind of a host path.
    pub fn bind(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, rw: bool) -> Self {
        Self {
            name: String::new(),
            driver: String::new(),
            source: Some(source.into()),
            destination: destination.into(),
            rw,
            mode: String::new(),
            propagation: None,
            volume: None,
        }
    }

    /// A mount backed by a managed volume.
    pub fn volume(volume: Arc<dyn Volume>, destination: impl Into<PathBuf>, rw: bool) -> Self {
        Self {
            name: volume.name().to_string(),
            driver: volume.driver().to_string(),
            source: None,
            destination: destination.into(),
            rw,
            mode: String::new(),
            propagation: None,
            volume: Some(volume),
        }
    }

    /// The explicit source, treating an empty path as absent.
    #[must_use]
    pub fn explicit_source(&self) -> Option<&Path> {
        self.source
            .as_deref()
            .filter(|source| !source.as_os_str().is_empty())
    }
}
