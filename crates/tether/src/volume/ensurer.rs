//! The volume initialization seam.

use std::sync::Arc;

use tether_common::{ContainerId, TetherResult};

use super::MountPoint;

/// Guarantees a mount point's volume exists and is initialized.
///
/// Implementations must be idempotent: calling `ensure` again for the same
/// container and mount point succeeds without side effects. After `Ok(())`,
/// a mount point carrying a volume must report a path for it. Concurrent
/// initialization of the same volume is the implementation's problem.
pub trait VolumeEnsurer: Send + Sync {
    /// Initialize the volume behind `mount_point` on behalf of `container_id`.
    ///
    /// # Errors
    ///
    /// Returns why the volume could not be initialized. Callers treat any
    /// error as fatal.
    fn ensure(&self, container_id: &ContainerId, mount_point: &MountPoint) -> TetherResult<()>;
}

impl<T: VolumeEnsurer + ?Sized> VolumeEnsurer for &T {
    fn ensure(&self, container_id: &ContainerId, mount_point: &MountPoint) -> TetherResult<()> {
        (**self).ensure(container_id, mount_point)
    }
}

impl<T: VolumeEnsurer + ?Sized> VolumeEnsurer for Arc<T> {
    fn ensure(&self, container_id: &ContainerId, mount_point: &MountPoint) -> TetherResult<()> {
        (**self).ensure(container_id, mount_point)
    }
}
