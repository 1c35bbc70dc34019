//! Domain primitive types used across the oscontainer workspace.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::NO_LIMIT;

/// cgroup hierarchy generation the process lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CgroupVersion {
    /// Legacy per-controller hierarchies.
    V1,
    /// Unified hierarchy.
    V2,
    /// No usable cgroup filesystem.
    #[default]
    None,
}

impl CgroupVersion {
    /// Returns `true` for `V1` and `V2`.
    #[must_use]
    pub const fn is_detected(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for CgroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
            Self::None => write!(f, "none"),
        }
    }
}

/// cgroup controllers consulted during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Controller {
    /// CPU bandwidth and shares.
    Cpu,
    /// CPU accounting.
    Cpuacct,
    /// CPU and memory node pinning.
    Cpuset,
    /// Memory limits and usage.
    Memory,
    /// Process count limits. Optional.
    Pids,
}

impl Controller {
    /// Every controller detection looks at.
    pub const ALL: [Self; 5] = [
        Self::Cpu,
        Self::Cpuacct,
        Self::Cpuset,
        Self::Memory,
        Self::Pids,
    ];

    /// Kernel name of the controller.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cpuacct => "cpuacct",
            Self::Cpuset => "cpuset",
            Self::Memory => "memory",
            Self::Pids => "pids",
        }
    }

    /// Looks a controller up by its kernel name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Whether container support needs this controller.
    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::Pids)
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw CPU controller values, carrying their sentinels verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuLimits {
    /// Bandwidth quota in microseconds, `-1` when unlimited or unset.
    pub quota_micros: i64,
    /// Bandwidth period in microseconds, `-1` when unknown.
    pub period_micros: i64,
    /// v1 `cpu.shares` or v2 `cpu.weight`, `-1` when unset.
    pub shares_or_weight: i64,
    /// CPUs granted by the cpuset controller, empty when unset.
    pub cpuset_cpus: BTreeSet<usize>,
}

impl Default for CpuLimits {
    fn default() -> Self {
        Self {
            quota_micros: NO_LIMIT,
            period_micros: NO_LIMIT,
            shares_or_weight: NO_LIMIT,
            cpuset_cpus: BTreeSet::new(),
        }
    }
}

impl CpuLimits {
    /// CPUs implied by the bandwidth quota, rounded up.
    ///
    /// `None` unless both quota and period are positive.
    #[must_use]
    pub fn quota_cpus(&self) -> Option<usize> {
        if self.quota_micros <= 0 || self.period_micros <= 0 {
            return None;
        }
        let quota = u64::try_from(self.quota_micros).ok()?;
        let period = u64::try_from(self.period_micros).ok()?;
        usize::try_from(quota.div_ceil(period)).ok()
    }
}

/// Raw memory controller values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimits {
    /// Limit in bytes, `-1` when unlimited or unknown.
    pub limit_bytes: i64,
    /// Current usage in bytes, `0` when unknown.
    pub usage_bytes: u64,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            limit_bytes: NO_LIMIT,
            usage_bytes: 0,
        }
    }
}

/// What the host itself offers the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Online logical processors, at least one.
    pub logical_cpu_count: usize,
    /// Scheduler affinity, `None` when it does not narrow the host set.
    pub affinity_mask: Option<BTreeSet<usize>>,
}

impl HostInfo {
    /// Host info with no affinity restriction.
    #[must_use]
    pub fn unrestricted(logical_cpu_count: usize) -> Self {
        Self {
            logical_cpu_count: logical_cpu_count.max(1),
            affinity_mask: None,
        }
    }
}
