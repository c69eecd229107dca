//! # tether
//!
//! Resolves the bind mounts a container needs at creation time.
//!
//! A [`Container`] declares [`MountPoint`](volume::MountPoint)s. The
//! [`MountAssembler`](mounts::MountAssembler) asks a
//! [`VolumeEnsurer`](volume::VolumeEnsurer) to initialize each backing volume,
//! resolves every mount's host source, and returns the list sorted for the
//! execution backend.
//!
//! ## Usage
//!
//! ```no_run
//! use tether::container::Container;
//! use tether::mounts::MountAssembler;
//! use tether::volume::{MountPoint, VolumeStore};
//! use tether_common::{ContainerId, TetherPaths};
//!
//! # fn example() -> tether_common::TetherResult<()> {
//! let store = VolumeStore::open(TetherPaths::new())?;
//!
//! let mut container = Container::new(ContainerId::new("web")?);
//! container.add_mount_point(MountPoint::volume(store.handle("data")?, "/data", true))?;
//! container.add_mount_point(MountPoint::bind("/srv/cache", "/cache", false))?;
//!
//! let mounts = MountAssembler::new(&store).assemble(&container)?;
//! assert_eq!(mounts[0].destination, std::path::Path::new("/cache"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod container;
pub mod mounts;
pub mod volume;

pub use config::TetherConfig;
pub use container::Container;
