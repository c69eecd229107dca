//! OCI runtime-spec mount entries.
//!
//! Based on the `mounts` section of the OCI Runtime Specification:
//! <https://github.com/opencontainers/runtime-spec/blob/main/config.md#mounts>

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::Mount;

/// An entry of `config.json`'s `mounts` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciMount {
    /// Mount destination path (inside container).
    pub destination: PathBuf,
    /// Mount type (e.g., "bind", "tmpfs", "proc").
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mount_type: Option<String>,
    /// Mount source path (outside container).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Mount options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl From<&Mount> for OciMount {
    fn from(mount: &Mount) -> Self {
        let access = if mount.writable { "rw" } else { "ro" };
        Self {
            destination: mount.destination.clone(),
            mount_type: Some("bind".to_string()),
            source: Some(mount.source.clone()),
            options: vec!["rbind".to_string(), access.to_string()],
        }
    }
}

/// Convert an assembled mount list, keeping its order.
#[must_use]
pub fn to_oci_mounts(mounts: &[Mount]) -> Vec<OciMount> {
    mounts.iter().map(OciMount::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_bind() {
        let mount = Mount {
            source: PathBuf::from("/srv/config"),
            destination: PathBuf::from("/etc/app"),
            writable: false,
        };
        let json = serde_json::to_value(OciMount::from(&mount)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "destination": "/etc/app",
                "type": "bind",
                "source": "/srv/config",
                "options": ["rbind", "ro"],
            })
        );
    }

    #[test]
    fn order_preserved() {
        let mounts = [
            Mount {
                source: PathBuf::from("/a"),
                destination: PathBuf::from("/1"),
                writable: true,
            },
            Mount {
                source: PathBuf::from("/b"),
                destination: PathBuf::from("/2"),
                writable: true,
            },
        ];
        let oci = to_oci_mounts(&mounts);
        assert_eq!(oci[0].destination, PathBuf::from("/1"));
        assert_eq!(oci[1].options, ["rbind", "rw"]);
    }
}
