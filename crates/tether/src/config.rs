//! Resolver configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tether_common::TetherPaths;

use crate::volume::{BindModeNormalizer, platform_normalizer};

/// Configuration shared by the volume store and mount assembly.
#[derive(Debug, Clone)]
pub struct TetherConfig {
    /// Paths for persistent data.
    pub paths: TetherPaths,
    /// Bind-mode defaults applied to named volumes.
    pub normalizer: Arc<dyn BindModeNormalizer>,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            paths: TetherPaths::new(),
            normalizer: platform_normalizer(),
        }
    }
}

impl TetherConfig {
    /// Set the root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = TetherPaths::with_root(root);
        self
    }

    /// Replace the platform bind-mode normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<dyn BindModeNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }
}
