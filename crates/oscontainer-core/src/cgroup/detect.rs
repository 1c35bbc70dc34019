//! cgroup hierarchy version detection.
//!
//! Combines three kernel views:
//! - `/proc/cgroups`: which controllers are enabled and whether they sit on
//!   the unified hierarchy (hierarchy id `0`). Optional.
//! - `/proc/self/cgroup`: the process's cgroup path per hierarchy.
//! - `/proc/self/mountinfo`: where each hierarchy is mounted and from which
//!   root, so the process's cgroup directory can be located.
//!
//! Any failure to read these files means "no cgroups" rather than an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use oscontainer_common::config::ProbeConfig;
use oscontainer_common::constants::{CGROUP_V2_PATH, CPU_MAX, MEMORY_MAX};
use oscontainer_common::error::{ErrorClass, Result};
use oscontainer_common::types::{CgroupVersion, Controller};

use super::ContainerContext;
use super::procfs::{self, CgroupMembership, ControllerStatus, MountInfo};

/// Classifies the environment described by `config`.
///
/// Never fails: unreadable or inconsistent kernel files yield
/// [`CgroupVersion::None`].
#[must_use]
pub fn detect(config: &ProbeConfig) -> ContainerContext {
    match try_detect(config) {
        Ok(Some(context)) => {
            tracing::debug!(
                version = %context.version,
                cgroup_path = %context.cgroup_path,
                at_host_root = context.at_host_root,
                "cgroup hierarchy detected"
            );
            context
        }
        Ok(None) => ContainerContext::none(),
        Err(e) => {
            match e.class() {
                ErrorClass::Unavailable => tracing::debug!(error = %e, "cgroup files unavailable"),
                ErrorClass::Malformed => tracing::warn!(error = %e, "cgroup files unreadable"),
            }
            ContainerContext::none()
        }
    }
}

fn try_detect(config: &ProbeConfig) -> Result<Option<ContainerContext>> {
    let table = match procfs::read_proc_cgroups(&config.resolve(&config.proc_cgroups)) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::debug!(error = %e, "controller table unavailable, classifying from membership");
            None
        }
    };

    if let Some(table) = &table {
        if let Some(disabled) = table.iter().find(|s| s.controller.is_required() && !s.enabled) {
            tracing::info!(controller = %disabled.controller, "required cgroup controller disabled");
            return Ok(None);
        }
    }

    let membership = procfs::read_self_cgroup(&config.resolve(&config.proc_self_cgroup))?;
    let mounts = procfs::read_mountinfo(&config.resolve(&config.proc_self_mountinfo))?;

    if is_unified(table.as_deref(), &membership) {
        Ok(detect_unified(config, &membership, &mounts))
    } else {
        Ok(detect_legacy(config, &membership, &mounts))
    }
}

/// Whether the required controllers live on the unified hierarchy.
fn is_unified(table: Option<&[ControllerStatus]>, membership: &[CgroupMembership]) -> bool {
    match table {
        Some(table) => table
            .iter()
            .filter(|s| s.controller.is_required())
            .all(|s| s.hierarchy_id == 0),
        None => !membership.is_empty() && membership.iter().all(|m| m.hierarchy_id == 0),
    }
}

fn detect_unified(
    config: &ProbeConfig,
    membership: &[CgroupMembership],
    mounts: &[MountInfo],
) -> Option<ContainerContext> {
    let Some(mount) = mounts.iter().find(|m| m.is_cgroup_v2()) else {
        tracing::warn!("no cgroup2 mount point in mountinfo");
        return None;
    };
    let Some(entry) = membership.iter().find(|m| m.hierarchy_id == 0) else {
        tracing::warn!("no unified hierarchy entry in cgroup membership");
        return None;
    };

    let dir = config.resolve(subsystem_dir(&mount.root, &mount.mount_point, &entry.path));
    // A namespaced cgroup also reads as "/", but unlike the host root it
    // carries the limit interface files.
    let at_host_root = entry.path == "/"
        && !dir.join(CPU_MAX).exists()
        && !dir.join(MEMORY_MAX).exists();

    let controller_dirs = Controller::ALL
        .into_iter()
        .map(|controller| (controller, dir.clone()))
        .collect();

    Some(ContainerContext {
        version: CgroupVersion::V2,
        cgroup_path: entry.path.clone(),
        controller_dirs,
        at_host_root,
    })
}

fn detect_legacy(
    config: &ProbeConfig,
    membership: &[CgroupMembership],
    mounts: &[MountInfo],
) -> Option<ContainerContext> {
    let mut controller_mounts: BTreeMap<Controller, &MountInfo> = BTreeMap::new();
    for mount in mounts.iter().filter(|m| m.is_cgroup_v1()) {
        for controller in mount.controllers() {
            match controller_mounts.get(&controller) {
                Some(existing) if !prefer_mount(controller, existing, mount) => {
                    tracing::debug!(
                        controller = %controller,
                        kept = %existing.mount_point,
                        skipped = %mount.mount_point,
                        "duplicate cgroup controller mount"
                    );
                }
                _ => {
                    let _ = controller_mounts.insert(controller, mount);
                }
            }
        }
    }

    if controller_mounts.is_empty() {
        tracing::warn!("no relevant cgroup controllers mounted");
        return None;
    }

    let mut controller_dirs = BTreeMap::new();
    let mut paths = BTreeMap::new();
    for controller in Controller::ALL {
        let mount = controller_mounts.get(&controller);
        let entry = membership.iter().find(|m| m.has(controller));
        match (mount, entry) {
            (Some(mount), Some(entry)) => {
                let dir = subsystem_dir(&mount.root, &mount.mount_point, &entry.path);
                let _ = controller_dirs.insert(controller, config.resolve(dir));
                let _ = paths.insert(controller, entry.path.clone());
            }
            _ if controller.is_required() => {
                tracing::warn!(controller = %controller, "required cgroup v1 controller not found");
                return None;
            }
            _ => {}
        }
    }

    let cgroup_path = paths
        .remove(&Controller::Memory)
        .unwrap_or_else(|| String::from("/"));
    let at_host_root = cgroup_path == "/";

    Some(ContainerContext {
        version: CgroupVersion::V1,
        cgroup_path,
        controller_dirs,
        at_host_root,
    })
}

/// Whether `candidate` should replace `existing` as the mount of `controller`.
///
/// Some systems mount an extra cpuset hierarchy outside `/sys/fs/cgroup`;
/// the conventional location wins.
fn prefer_mount(controller: Controller, existing: &MountInfo, candidate: &MountInfo) -> bool {
    controller == Controller::Cpuset
        && !Path::new(&existing.mount_point).starts_with(CGROUP_V2_PATH)
        && Path::new(&candidate.mount_point).starts_with(CGROUP_V2_PATH)
}

/// Directory holding the process's controller files.
///
/// On the host the mount root is `/` and the cgroup path is appended to the
/// mount point. Inside a container the mount root is the container's own
/// cgroup, so only the part of the path below that root is appended.
pub fn subsystem_dir(mount_root: &str, mount_point: &str, cgroup_path: &str) -> PathBuf {
    let base = PathBuf::from(mount_point);
    let relative = if mount_root == "/" {
        Path::new(cgroup_path).strip_prefix("/").ok()
    } else {
        Path::new(cgroup_path).strip_prefix(mount_root).ok()
    };
    match relative {
        Some(rel) if !rel.as_os_str().is_empty() => base.join(rel),
        _ => base,
    }
}
