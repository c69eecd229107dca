//! `source:destination[:options]` bind specifications.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tether_common::{TetherError, TetherResult};

use super::{BindModeNormalizer, MountPoint, Propagation, Volume, validate_volume_name};

/// Where a bind specification takes its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindSource {
    /// Absolute host path, bound as-is.
    Host(PathBuf),
    /// Named volume.
    Volume(String),
}

/// A parsed bind specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindSpec {
    /// Host path or volume name.
    pub source: BindSource,
    /// Absolute path inside the container.
    pub destination: PathBuf,
    /// Mounted read-write.
    pub rw: bool,
    /// The options segment exactly as written.
    pub mode: String,
    /// Requested propagation.
    pub propagation: Option<Propagation>,
}

impl BindSpec {
    /// Parse `source:destination[:options]`.
    ///
    /// Options are comma separated: `ro`/`rw`, `z`/`Z` and propagation names.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::InvalidBindSpec`] describing the first problem.
    pub fn parse(raw: &str) -> TetherResult<Self> {
        let invalid = |reason: &str| TetherError::InvalidBindSpec {
            spec: raw.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = raw.split(':').collect();
        let (source, destination, mode) = match parts.as_slice() {
            [source, destination] => (*source, *destination, ""),
            [source, destination, mode] => (*source, *destination, *mode),
            [_] => return Err(invalid("missing destination")),
            _ => return Err(invalid("too many ':' separated fields")),
        };

        let source = if source.is_empty() {
            return Err(invalid("empty source"));
        } else if Path::new(source).is_absolute() {
            BindSource::Host(PathBuf::from(source))
        } else {
            validate_volume_name(source).map_err(|_| invalid("invalid volume name"))?;
            BindSource::Volume(source.to_string())
        };

        let destination = PathBuf::from(destination);
        if !destination.is_absolute() {
            return Err(invalid("destination must be an absolute path"));
        }
        if destination == Path::new("/") {
            return Err(invalid("destination can't be '/'"));
        }

        let mut rw = None;
        let mut label = None;
        let mut propagation = None;
        for option in mode.split(',').filter(|o| !o.is_empty()) {
            match option {
                "ro" | "rw" => {
                    if rw.replace(option == "rw").is_some() {
                        return Err(invalid("conflicting read-write options"));
                    }
                }
                "z" | "Z" => {
                    if label.replace(option).is_some() {
                        return Err(invalid("conflicting relabel options"));
                    }
                }
                other => {
                    let parsed: Propagation = other
                        .parse()
                        .map_err(|_| invalid(&format!("unknown option '{other}'")))?;
                    if propagation.replace(parsed).is_some() {
                        return Err(invalid("conflicting propagation options"));
                    }
                }
            }
        }

        Ok(Self {
            source,
            destination,
            rw: rw.unwrap_or(true),
            mode: mode.to_string(),
            propagation,
        })
    }

    /// Build the container mount point.
    ///
    /// Named volumes are looked up through `lookup` and run through the
    /// normalizer; host binds keep exactly what was written.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures.
    pub fn into_mount_point<F>(
        self,
        lookup: F,
        normalizer: &dyn BindModeNormalizer,
    ) -> TetherResult<MountPoint>
    where
        F: FnOnce(&str) -> TetherResult<Arc<dyn Volume>>,
    {
        match self.source {
            BindSource::Host(path) => {
                let mut mount_point = MountPoint::bind(path, self.destination, self.rw);
                mount_point.mode = self.mode;
                mount_point.propagation = self.propagation;
                Ok(mount_point)
            }
            BindSource::Volume(name) => {
                let mut mount_point = MountPoint::volume(lookup(&name)?, self.destination, self.rw);
                mount_point.mode = self.mode;
                mount_point.propagation = self.propagation;
                Ok(normalizer.normalize(mount_point))
            }
        }
    }
}
