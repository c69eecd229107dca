//! Platform bind-mode defaults.
//!
//! Named volumes pick up platform-specific mode defaults before they are
//! registered on a container. Which strategy applies is decided once, at
//! startup, by [`platform_normalizer`] or by configuration.

use std::fmt;
use std::sync::Arc;

use super::{MountPoint, Propagation};

/// Fills in platform defaults on a named-volume mount point.
pub trait BindModeNormalizer: Send + Sync + fmt::Debug {
    /// Return the mount point with defaults applied.
    fn normalize(&self, mount_point: MountPoint) -> MountPoint;
}

/// Identity normalizer for platforms without bind propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl BindModeNormalizer for PassThrough {
    fn normalize(&self, mount_point: MountPoint) -> MountPoint {
        mount_point
    }
}

/// Linux defaults: shared SELinux relabel and recursive-private propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelingDefaults;

impl LabelingDefaults {
    /// Mode applied when none was given.
    pub const DEFAULT_MODE: &'static str = "z";
    /// Propagation applied when none was given.
    pub const DEFAULT_PROPAGATION: Propagation = Propagation::RPrivate;
}

impl BindModeNormalizer for LabelingDefaults {
    fn normalize(&self, mut mount_point: MountPoint) -> MountPoint {
        if mount_point.mode.is_empty() {
            mount_point.mode = Self::DEFAULT_MODE.to_string();
        }
        mount_point
            .propagation
            .get_or_insert(Self::DEFAULT_PROPAGATION);
        mount_point
    }
}

/// The normalizer for the platform this binary was built for.
#[must_use]
pub fn platform_normalizer() -> Arc<dyn BindModeNormalizer> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(LabelingDefaults)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(PassThrough)
    }
}
