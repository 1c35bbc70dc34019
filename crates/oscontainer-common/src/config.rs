//! Probe configuration: where the kernel interfaces are read from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;

/// Locations and thresholds used by a detection run.
///
/// Every absolute path (the proc files below and every mount point found in
/// the mount table) is re-rooted under [`ProbeConfig::root`], so a test can
/// point the whole pipeline at a fixture tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Filesystem prefix for all kernel interface paths.
    pub root: PathBuf,
    /// The process's cgroup membership file.
    pub proc_self_cgroup: PathBuf,
    /// The process's mount table.
    pub proc_self_mountinfo: PathBuf,
    /// The kernel's controller table.
    pub proc_cgroups: PathBuf,
    /// v1 memory limits at or above this are reported as unlimited.
    pub v1_unlimited_threshold: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            proc_self_cgroup: PathBuf::from(constants::PROC_SELF_CGROUP),
            proc_self_mountinfo: PathBuf::from(constants::PROC_SELF_MOUNTINFO),
            proc_cgroups: PathBuf::from(constants::PROC_CGROUPS),
            v1_unlimited_threshold: constants::V1_UNLIMITED_THRESHOLD,
        }
    }
}

impl ProbeConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Maps an absolute kernel path into the configured root.
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }
}
