//! cgroup detection and controller readers.
//!
//! [`detect`] classifies the process's environment as v1, v2 or none and
//! resolves where each controller's files live. [`read_cpu`] and
//! [`read_memory`] then dispatch to the matching reader.

pub mod detect;
pub mod io;
pub mod procfs;
pub mod v1;
pub mod v2;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use oscontainer_common::config::ProbeConfig;
use oscontainer_common::types::{CgroupVersion, Controller, CpuLimits, MemoryLimits};
use serde::Serialize;

pub use detect::detect;

/// Where the process sits in the cgroup hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerContext {
    /// Hierarchy generation detected.
    pub version: CgroupVersion,
    /// The process's cgroup path, `/` at the root.
    pub cgroup_path: String,
    /// Directory holding each controller's files.
    pub controller_dirs: BTreeMap<Controller, PathBuf>,
    /// Whether the cgroup is the host's root cgroup.
    pub at_host_root: bool,
}

impl ContainerContext {
    /// Context for an environment without usable cgroups.
    #[must_use]
    pub fn none() -> Self {
        Self {
            version: CgroupVersion::None,
            cgroup_path: String::from("/"),
            controller_dirs: BTreeMap::new(),
            at_host_root: true,
        }
    }

    /// Directory of `controller`'s files, if it was resolved.
    #[must_use]
    pub fn controller_dir(&self, controller: Controller) -> Option<&Path> {
        self.controller_dirs.get(&controller).map(PathBuf::as_path)
    }

    /// Whether a containment boundary separates the process from the host.
    #[must_use]
    pub const fn is_containerized(&self) -> bool {
        self.version.is_detected() && !self.at_host_root
    }
}

/// Reads the CPU controller values for `context`.
#[must_use]
pub fn read_cpu(context: &ContainerContext) -> CpuLimits {
    match context.version {
        CgroupVersion::V1 => v1::read_cpu(context),
        CgroupVersion::V2 => v2::read_cpu(context),
        CgroupVersion::None => CpuLimits::default(),
    }
}

/// Reads the memory controller values for `context`.
#[must_use]
pub fn read_memory(context: &ContainerContext, config: &ProbeConfig) -> MemoryLimits {
    match context.version {
        CgroupVersion::V1 => v1::read_memory(context, config.v1_unlimited_threshold),
        CgroupVersion::V2 => v2::read_memory(context),
        CgroupVersion::None => MemoryLimits::default(),
    }
}
