//! Standard filesystem paths for tether.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Default root directory for tether data.
pub static TETHER_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("TETHER_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/tether"))
});

/// Name of the directory holding a volume's contents.
const VOLUME_DATA_DIR: &str = "_data";

/// Name of the file holding a volume's persisted metadata.
const VOLUME_METADATA_FILE: &str = "metadata.json";

/// Standard paths used by tether.
#[derive(Debug, Clone)]
pub struct TetherPaths {
    /// Root data directory (default: /var/lib/tether).
    pub root: PathBuf,
}

impl TetherPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Volumes directory.
    #[must_use]
    pub fn volumes(&self) -> PathBuf {
        self.root.join("volumes")
    }

    /// Directory owned by a single volume.
    #[must_use]
    pub fn volume(&self, name: &str) -> PathBuf {
        self.volumes().join(name)
    }

    /// Host-side path that gets bind-mounted into containers.
    #[must_use]
    pub fn volume_data(&self, name: &str) -> PathBuf {
        self.volume(name).join(VOLUME_DATA_DIR)
    }

    /// Metadata file of a volume. Lives beside `_data`, never inside it.
    #[must_use]
    pub fn volume_metadata(&self, name: &str) -> PathBuf {
        self.volume(name).join(VOLUME_METADATA_FILE)
    }
}

impl Default for TetherPaths {
    fn default() -> Self {
        Self {
            root: TETHER_ROOT.clone(),
        }
    }
}
