//! Directory-backed volume store for the `local` driver.
//!
//! Layout under the volumes directory:
//!
//! ```text
//! <root>/volumes/<name>/metadata.json
//! <root>/volumes/<name>/_data/
//! ```
//!
//! Volumes are created lazily: [`VolumeStore::handle`] hands out an
//! uninitialized handle and the first [`VolumeEnsurer::ensure`] call that
//! needs it creates the data directory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tether_common::{ContainerId, TetherError, TetherPaths, TetherResult};

use super::{LOCAL_DRIVER, LocalVolume, MountPoint, Volume, VolumeEnsurer, validate_volume_name};

/// Volume store for the `local` driver.
#[derive(Debug)]
pub struct VolumeStore {
    paths: TetherPaths,
    volumes: DashMap<String, StoredVolume>,
}

#[derive(Debug)]
struct StoredVolume {
    handle: Arc<LocalVolume>,
    metadata: Option<VolumeMetadata>,
}

/// Snapshot of a volume for listing and inspection.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeInfo {
    /// Volume name.
    pub name: String,
    /// Volume driver.
    pub driver: String,
    /// Host path of the data directory, once initialized.
    pub path: Option<std::path::PathBuf>,
    /// User labels.
    pub labels: HashMap<String, String>,
    /// Creation timestamp, once initialized.
    pub created: Option<DateTime<Utc>>,
    /// Containers referencing the volume.
    pub containers: Vec<String>,
}

/// Volume metadata for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VolumeMetadata {
    name: String,
    driver: String,
    #[serde(default)]
    labels: HashMap<String, String>,
    created: DateTime<Utc>,
}

impl VolumeStore {
    /// Open the store, loading every persisted volume.
    ///
    /// # Errors
    ///
    /// Fails if the volumes directory cannot be created or read, or if a
    /// metadata file is corrupt.
    pub fn open(paths: TetherPaths) -> TetherResult<Self> {
        fs::create_dir_all(paths.volumes())?;

        let store = Self {
            paths,
            volumes: DashMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Handle for the named volume, registering an uninitialized one if the
    /// store has never seen the name.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::InvalidVolumeName`] for unusable names.
    pub fn handle(&self, name: &str) -> TetherResult<Arc<LocalVolume>> {
        validate_volume_name(name)?;
        let stored = self
            .volumes
            .entry(name.to_string())
            .or_insert_with(|| StoredVolume::new(name));
        Ok(Arc::clone(&stored.handle))
    }

    /// Create and initialize a volume eagerly.
    ///
    /// # Errors
    ///
    /// Fails if the name is invalid, the volume is already initialized, or
    /// the data directory cannot be created.
    pub fn create(&self, name: &str, labels: HashMap<String, String>) -> TetherResult<VolumeInfo> {
        validate_volume_name(name)?;

        let mut stored = self
            .volumes
            .entry(name.to_string())
            .or_insert_with(|| StoredVolume::new(name));

        if stored.handle.is_initialized() {
            return Err(TetherError::Config {
                message: format!("Volume '{name}' already exists"),
            });
        }

        self.initialize(&mut stored, labels)?;
        Ok(stored.info())
    }

    /// Look up a volume.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<VolumeInfo> {
        self.volumes.get(name).map(|stored| stored.info())
    }

    /// All known volumes, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<VolumeInfo> {
        let mut volumes: Vec<_> = self.volumes.iter().map(|stored| stored.info()).collect();
        volumes.sort_by(|a, b| a.name.cmp(&b.name));
        volumes
    }

    /// Remove a volume and its data.
    ///
    /// # Errors
    ///
    /// Fails if the volume is unknown, still referenced (unless `force`), or
    /// its directory cannot be removed.
    pub fn remove(&self, name: &str, force: bool) -> TetherResult<()> {
        let Entry::Occupied(entry) = self.volumes.entry(name.to_string()) else {
            return Err(TetherError::VolumeNotFound {
                name: name.to_string(),
            });
        };

        let containers = ref_names(&entry.get().handle);
        if !force && !containers.is_empty() {
            return Err(TetherError::VolumeInUse {
                name: name.to_string(),
                containers,
            });
        }

        // Delete while still holding the entry so a concurrent ensure cannot
        // re-initialize the volume underneath us.
        let dir = self.paths.volume(name);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        entry.remove();

        tracing::info!(name, force, "Volume removed");
        Ok(())
    }

    /// Drop every reference held by a container.
    pub fn release(&self, container_id: &ContainerId) {
        let mut released = 0usize;
        for stored in self.volumes.iter() {
            if stored.handle.remove_ref(container_id) {
                released += 1;
            }
        }
        tracing::debug!(container_id = %container_id, released, "Released volume references");
    }

    /// Create the data directory and persist metadata.
    fn initialize(
        &self,
        stored: &mut StoredVolume,
        labels: HashMap<String, String>,
    ) -> io::Result<()> {
        let name = stored.handle.name().to_string();
        let data = self.paths.volume_data(&name);
        fs::create_dir_all(&data)?;

        let metadata = match stored.metadata.take() {
            Some(existing) => existing,
            None => VolumeMetadata {
                name: name.clone(),
                driver: LOCAL_DRIVER.to_string(),
                labels,
                created: Utc::now(),
            },
        };
        fs::write(
            self.paths.volume_metadata(&name),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        stored.metadata = Some(metadata);
        stored.handle.set_path(data.clone());

        tracing::info!(name = %name, path = %data.display(), "Volume initialized");
        Ok(())
    }

    /// Load existing volumes from disk.
    fn load(&self) -> TetherResult<()> {
        for entry in fs::read_dir(self.paths.volumes())? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let metadata_path = self.paths.volume_metadata(&name);
            if !metadata_path.exists() {
                continue;
            }

            let content = fs::read_to_string(&metadata_path)?;
            let metadata: VolumeMetadata = serde_json::from_str(&content)?;

            if metadata.name != name {
                tracing::warn!(
                    dir = %name,
                    name = %metadata.name,
                    "Skipping volume whose metadata does not match its directory"
                );
                continue;
            }

            let handle = LocalVolume::initialized(
                metadata.name.clone(),
                self.paths.volume_data(&metadata.name),
            );
            self.volumes.insert(
                metadata.name.clone(),
                StoredVolume {
                    handle: Arc::new(handle),
                    metadata: Some(metadata),
                },
            );
        }

        tracing::debug!(count = self.volumes.len(), "Loaded existing volumes");
        Ok(())
    }
}

impl VolumeEnsurer for VolumeStore {
    fn ensure(&self, container_id: &ContainerId, mount_point: &MountPoint) -> TetherResult<()> {
        let Some(volume) = &mount_point.volume else {
            return Ok(());
        };
        let name = volume.name();
        let driver = volume.driver();
        let init_error = |reason: String| TetherError::VolumeInit {
            name: name.to_string(),
            driver: driver.to_string(),
            reason,
        };

        if driver != LOCAL_DRIVER {
            return Err(init_error(format!("unsupported volume driver '{driver}'")));
        }
        validate_volume_name(name)?;

        // The map guard serializes initialization of the same name.
        let Some(mut stored) = self
            .volumes
            .get_mut(name)
            .filter(|stored| std::ptr::addr_eq(Arc::as_ptr(volume), Arc::as_ptr(&stored.handle)))
        else {
            return Err(init_error(
                "volume handle was not issued by this store".to_string(),
            ));
        };

        let data_present = stored
            .handle
            .path()
            .is_some_and(|path| path.is_dir());
        if !data_present {
            self.initialize(&mut stored, HashMap::new())
                .map_err(|e| init_error(e.to_string()))?;
        }

        if stored.handle.add_ref(container_id) {
            tracing::debug!(
                volume = name,
                container_id = %container_id,
                "Volume referenced by container"
            );
        }
        Ok(())
    }
}

impl StoredVolume {
    fn new(name: &str) -> Self {
        Self {
            handle: Arc::new(LocalVolume::new(name)),
            metadata: None,
        }
    }

    fn info(&self) -> VolumeInfo {
        let metadata = self.metadata.as_ref();
        VolumeInfo {
            name: self.handle.name().to_string(),
            driver: LOCAL_DRIVER.to_string(),
            path: self.handle.path(),
            labels: metadata.map(|m| m.labels.clone()).unwrap_or_default(),
            created: metadata.map(|m| m.created),
            containers: ref_names(&self.handle),
        }
    }
}

fn ref_names(volume: &LocalVolume) -> Vec<String> {
    volume
        .refs()
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect()
}
