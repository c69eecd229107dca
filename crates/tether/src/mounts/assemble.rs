//! Mount assembly.

use std::path::PathBuf;

use tether_common::{TetherError, TetherResult};

use super::{Mount, compare_mounts};
use crate::container::Container;
use crate::volume::{MountPoint, VolumeEnsurer};

/// Effective host source of a mount point.
///
/// An explicit, non-empty source always wins, even when a volume is also
/// attached. Otherwise the volume's path is used if it has a non-empty one.
#[must_use]
pub fn resolve_source(mount_point: &MountPoint) -> Option<PathBuf> {
    if let Some(source) = mount_point.explicit_source() {
        return Some(source.to_path_buf());
    }
    mount_point
        .volume
        .as_ref()
        .and_then(|volume| volume.path())
        .filter(|path| !path.as_os_str().is_empty())
}

/// Turns a container's mount points into the sorted mount list for the
/// execution backend.
#[derive(Debug, Clone)]
pub struct MountAssembler<E> {
    ensurer: E,
}

impl<E: VolumeEnsurer> MountAssembler<E> {
    /// Create an assembler around a volume ensurer.
    pub fn new(ensurer: E) -> Self {
        Self { ensurer }
    }

    /// The injected ensurer.
    pub fn ensurer(&self) -> &E {
        &self.ensurer
    }

    /// Resolve every mount point of `container`.
    ///
    /// All or nothing: the first ensurer failure or unresolvable source is
    /// returned and no mounts are produced.
    ///
    /// # Errors
    ///
    /// Ensurer errors are returned unchanged. A mount point with no
    /// resolvable source yields [`TetherError::NoSourceForMount`].
    pub fn assemble(&self, container: &Container) -> TetherResult<Vec<Mount>> {
        let container_id = container.id();
        let mut mounts = Vec::with_capacity(container.len());

        for mount_point in container.mount_points() {
            if let Err(err) = self.ensurer.ensure(container_id, mount_point) {
                tracing::warn!(
                    container_id = %container_id,
                    mount = %mount_point.name,
                    error = %err,
                    "Volume initialization failed"
                );
                return Err(err);
            }

            let Some(source) = resolve_source(mount_point) else {
                tracing::warn!(
                    container_id = %container_id,
                    mount = %mount_point.name,
                    destination = %mount_point.destination.display(),
                    "Mount point has no source"
                );
                return Err(TetherError::NoSourceForMount {
                    name: mount_point.name.clone(),
                    driver: mount_point.driver.clone(),
                    destination: mount_point.destination.clone(),
                });
            };

            tracing::debug!(
                source = %source.display(),
                destination = %mount_point.destination.display(),
                writable = mount_point.rw,
                "Resolved mount"
            );

            mounts.push(Mount {
                source,
                destination: mount_point.destination.clone(),
                writable: mount_point.rw,
            });
        }

        mounts.sort_by(compare_mounts);

        tracing::info!(
            container_id = %container_id,
            count = mounts.len(),
            "Assembled container mounts"
        );
        Ok(mounts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use proptest::prelude::*;
    use tether_common::{ContainerId, TetherPaths};

    use super::*;
    use crate::volume::{Volume, VolumeStore};

    #[derive(Debug)]
    struct FakeVolume {
        name: String,
        path: Option<PathBuf>,
    }

    impl Volume for FakeVolume {
        fn name(&self) -> &str {
            &self.name
        }

        fn driver(&self) -> &str {
            "fake"
        }

        fn path(&self) -> Option<PathBuf> {
            self.path.clone()
        }
    }

    fn fake_volume(name: &str, path: Option<&str>) -> Arc<dyn Volume> {
        Arc::new(FakeVolume {
            name: name.to_string(),
            path: path.map(PathBuf::from),
        })
    }

    /// Accepts everything and records which mounts it saw.
    #[derive(Default)]
    struct RecordingEnsurer {
        seen: Mutex<Vec<String>>,
    }

    impl VolumeEnsurer for RecordingEnsurer {
        fn ensure(&self, _: &ContainerId, mount_point: &MountPoint) -> TetherResult<()> {
            self.seen.lock().push(mount_point.name.clone());
            Ok(())
        }
    }

    /// Fails for a single mount name.
    struct FailingEnsurer(&'static str);

    impl VolumeEnsurer for FailingEnsurer {
        fn ensure(&self, _: &ContainerId, mount_point: &MountPoint) -> TetherResult<()> {
            if mount_point.name == self.0 {
                return Err(TetherError::VolumeInit {
                    name: mount_point.name.clone(),
                    driver: mount_point.driver.clone(),
                    reason: "driver unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    fn container() -> Container {
        Container::new(ContainerId::new("web").unwrap())
    }

    fn named(volume: Arc<dyn Volume>, destination: &str) -> MountPoint {
        MountPoint::volume(volume, destination, true)
    }

    fn mount(source: &str, destination: &str, writable: bool) -> Mount {
        Mount {
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
            writable,
        }
    }

    #[test_log::test]
    fn resolves_and_sorts_by_destination() {
        let mut b = MountPoint::bind("/host/cache", "/cache", true);
        b.name = "b".to_string();
        let container = container()
            .with_mount_point(named(fake_volume("a", Some("/var/vol/a")), "/data"))
            .unwrap()
            .with_mount_point(b)
            .unwrap();

        let assembler = MountAssembler::new(RecordingEnsurer::default());
        let mounts = assembler.assemble(&container).unwrap();

        assert_eq!(
            mounts,
            vec![
                mount("/host/cache", "/cache", true),
                mount("/var/vol/a", "/data", true),
            ]
        );
        let mut seen = assembler.ensurer().seen.lock().clone();
        seen.sort();
        assert_eq!(seen, ["a", "b"]);
    }

    #[test]
    fn writable_flag_carried_through() {
        let container = container()
            .with_mount_point(MountPoint::bind("/etc/app", "/etc/app", false))
            .unwrap();
        let mounts = MountAssembler::new(RecordingEnsurer::default())
            .assemble(&container)
            .unwrap();
        assert_eq!(mounts, vec![mount("/etc/app", "/etc/app", false)]);
    }

    #[test]
    fn explicit_source_wins_over_volume_path() {
        let mut mp = named(fake_volume("a", Some("/var/vol/a")), "/data");
        mp.source = Some(PathBuf::from("/override"));
        assert_eq!(resolve_source(&mp), Some(PathBuf::from("/override")));

        mp.source = Some(PathBuf::new());
        assert_eq!(resolve_source(&mp), Some(PathBuf::from("/var/vol/a")));
    }

    #[test]
    fn missing_source_is_reported() {
        let mut mp = MountPoint::bind("", "/x", true);
        mp.name = "x".to_string();
        let container = container().with_mount_point(mp).unwrap();

        let err = MountAssembler::new(RecordingEnsurer::default())
            .assemble(&container)
            .unwrap_err();
        match err {
            TetherError::NoSourceForMount {
                name,
                driver,
                destination,
            } => {
                assert_eq!(name, "x");
                assert!(driver.is_empty());
                assert_eq!(destination, PathBuf::from("/x"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_volume_path_is_unresolvable() {
        let container = container()
            .with_mount_point(named(fake_volume("v", Some("")), "/v"))
            .unwrap()
            .with_mount_point(named(fake_volume("w", None), "/w"))
            .unwrap()
            .with_mount_point(MountPoint::bind("/ok", "/ok", true))
            .unwrap();

        let err = MountAssembler::new(RecordingEnsurer::default())
            .assemble(&container)
            .unwrap_err();
        assert!(matches!(
            err,
            TetherError::NoSourceForMount { ref driver, .. } if driver == "fake"
        ));
    }

    #[test]
    fn ensurer_failure_aborts_everything() {
        let container = container()
            .with_mount_point(named(fake_volume("ok", Some("/vol/ok")), "/ok"))
            .unwrap()
            .with_mount_point(named(fake_volume("y", Some("/vol/y")), "/y"))
            .unwrap();

        let err = MountAssembler::new(FailingEnsurer("y"))
            .assemble(&container)
            .unwrap_err();
        assert!(matches!(
            err,
            TetherError::VolumeInit { ref name, ref reason, .. }
                if name == "y" && reason == "driver unavailable"
        ));
    }

    #[test]
    fn empty_container_yields_empty_list() {
        let mounts = MountAssembler::new(RecordingEnsurer::default())
            .assemble(&container())
            .unwrap();
        assert!(mounts.is_empty());
    }

    #[test]
    fn assembly_is_repeatable_against_a_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VolumeStore::open(TetherPaths::with_root(tmp.path())).unwrap();
        let container = container()
            .with_mount_point(MountPoint::volume(store.handle("data").unwrap(), "/data", true))
            .unwrap()
            .with_mount_point(MountPoint::bind("/srv/logs", "/logs", false))
            .unwrap();

        let assembler = MountAssembler::new(&store);
        let first = assembler.assemble(&container).unwrap();
        let second = assembler.assemble(&container).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Mount {
                    source: tmp.path().join("volumes/data/_data"),
                    destination: PathBuf::from("/data"),
                    writable: true,
                },
                mount("/srv/logs", "/logs", false),
            ]
        );
    }

    fn arb_mount_point() -> impl Strategy<Value = MountPoint> {
        (
            "/[a-c]{1,3}(/[a-c]{1,2})?",
            prop_oneof![
                "/host/[a-z]{1,4}".prop_map(Some),
                Just(None::<String>),
            ],
            any::<bool>(),
        )
            .prop_map(|(destination, explicit, rw)| match explicit {
                Some(source) => MountPoint::bind(source, destination, rw),
                None => {
                    let path = format!("/var/vol{destination}");
                    MountPoint::volume(fake_volume("v", Some(&path)), destination, rw)
                }
            })
    }

    proptest! {
        #[test]
        fn resolvable_containers_assemble_sorted(
            mount_points in proptest::collection::vec(arb_mount_point(), 0..12)
        ) {
            let mut container = container();
            for mp in mount_points {
                // Duplicate destinations are rejected; keep the first.
                let _ = container.add_mount_point(mp);
            }

            let mounts = MountAssembler::new(RecordingEnsurer::default())
                .assemble(&container)
                .unwrap();

            prop_assert_eq!(mounts.len(), container.len());
            for pair in mounts.windows(2) {
                prop_assert!(compare_mounts(&pair[0], &pair[1]).is_le());
            }
            for m in &mounts {
                let mp = container.mount_point(&m.destination).unwrap();
                prop_assert_eq!(Some(m.source.clone()), resolve_source(mp));
                prop_assert_eq!(m.writable, mp.rw);
            }
        }

        #[test]
        fn one_unresolvable_mount_fails_the_whole_container(
            mount_points in proptest::collection::vec(arb_mount_point(), 0..8)
        ) {
            let mut container = container();
            for mp in mount_points {
                let _ = container.add_mount_point(mp);
            }
            container
                .add_mount_point(named(fake_volume("broken", None), "/zz/broken"))
                .unwrap();

            let result = MountAssembler::new(RecordingEnsurer::default()).assemble(&container);
            let is_no_source = matches!(result, Err(TetherError::NoSourceForMount { .. }));
            prop_assert!(is_no_source);
        }
    }
}
