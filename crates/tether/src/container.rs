//! Containers and their declared mount points.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use tether_common::{ContainerId, TetherError, TetherResult};

use crate::volume::MountPoint;

/// A container instance as seen by mount resolution.
///
/// Mount points are keyed by destination; iteration order is unspecified.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    mount_points: HashMap<PathBuf, MountPoint>,
}

impl Container {
    /// Create a container with no mount points.
    #[must_use]
    pub fn new(id: ContainerId) -> Self {
        Self {
            id,
            mount_points: HashMap::new(),
        }
    }

    /// Container ID.
    #[must_use]
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Register a mount point.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::DuplicateMountPoint`] if another mount point
    /// already targets the same destination.
    pub fn add_mount_point(&mut self, mount_point: MountPoint) -> TetherResult<()> {
        match self.mount_points.entry(mount_point.destination.clone()) {
            Entry::Occupied(entry) => Err(TetherError::DuplicateMountPoint {
                destination: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(mount_point);
                Ok(())
            }
        }
    }

    /// Builder form of [`Container::add_mount_point`].
    ///
    /// # Errors
    ///
    /// Same as [`Container::add_mount_point`].
    pub fn with_mount_point(mut self, mount_point: MountPoint) -> TetherResult<Self> {
        self.add_mount_point(mount_point)?;
        Ok(self)
    }

    /// Mount point at a destination.
    #[must_use]
    pub fn mount_point(&self, destination: &Path) -> Option<&MountPoint> {
        self.mount_points.get(destination)
    }

    /// All mount points, in no particular order.
    pub fn mount_points(&self) -> impl Iterator<Item = &MountPoint> {
        self.mount_points.values()
    }

    /// Number of mount points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mount_points.len()
    }

    /// Whether the container declares no mounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mount_points.is_empty()
    }
}
