//! Common error types for tether.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`TetherError`].
pub type TetherResult<T> = Result<T, TetherError>;

/// Errors produced while resolving container mounts.
#[derive(Error, Diagnostic, Debug)]
pub enum TetherError {
    /// A mount point has neither an explicit source nor a volume path.
    #[error(
        "No source for mount name '{name}' driver '{driver}' destination '{}'",
        .destination.display()
    )]
    #[diagnostic(
        code(tether::mount::no_source),
        help("Give the mount an absolute host path or attach it to a named volume")
    )]
    NoSourceForMount {
        /// Mount point name.
        name: String,
        /// Volume driver of the mount point.
        driver: String,
        /// Destination inside the container.
        destination: PathBuf,
    },

    /// A volume could not be initialized.
    #[error("Failed to initialize volume '{name}' (driver '{driver}'): {reason}")]
    #[diagnostic(code(tether::volume::init))]
    VolumeInit {
        /// Volume name.
        name: String,
        /// Volume driver.
        driver: String,
        /// Why initialization failed.
        reason: String,
    },

    /// Two mount points target the same destination.
    #[error("Duplicate mount point: {}", .destination.display())]
    #[diagnostic(code(tether::mount::duplicate))]
    DuplicateMountPoint {
        /// The contested destination.
        destination: PathBuf,
    },

    /// Invalid container ID format.
    #[error("Invalid container ID: {id}")]
    #[diagnostic(
        code(tether::container::invalid_id),
        help("Container IDs must be alphanumeric with hyphens and underscores, 1-64 characters")
    )]
    InvalidContainerId {
        /// The invalid container ID.
        id: String,
    },

    /// Invalid volume name.
    #[error("Invalid volume name: {name}")]
    #[diagnostic(
        code(tether::volume::invalid_name),
        help("Volume names start with an alphanumeric character and may contain '_', '.' and '-'")
    )]
    InvalidVolumeName {
        /// The invalid name.
        name: String,
    },

    /// A bind specification could not be parsed.
    #[error("Invalid bind specification '{spec}': {reason}")]
    #[diagnostic(
        code(tether::mount::invalid_bind),
        help("Use 'source:destination[:options]', e.g. '/srv/data:/data:ro' or 'cache:/cache'")
    )]
    InvalidBindSpec {
        /// The raw specification.
        spec: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Volume not found.
    #[error("Volume not found: {name}")]
    #[diagnostic(code(tether::volume::not_found))]
    VolumeNotFound {
        /// The volume name.
        name: String,
    },

    /// Volume is still referenced by containers.
    #[error("Volume '{name}' is in use by: {}", .containers.join(", "))]
    #[diagnostic(
        code(tether::volume::in_use),
        help("Remove the containers first or pass --force")
    )]
    VolumeInUse {
        /// The volume name.
        name: String,
        /// Containers holding a reference.
        containers: Vec<String>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(tether::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(tether::serialization))]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(tether::config))]
    Config {
        /// The error message.
        message: String,
    },
}

impl TetherError {
    /// Whether retrying the same operation could succeed.
    ///
    /// Configuration errors never resolve themselves; only raw I/O failures
    /// are worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<serde_json::Error> for TetherError {
    fn from(err: serde_json::Error) -> Self {
        TetherError::Serialization(err.to_string())
    }
}
