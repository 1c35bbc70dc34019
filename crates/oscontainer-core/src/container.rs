//! The [`OsContainer`] facade and the [`ResourceSnapshot`] it caches.
//!
//! Construction runs the whole pipeline once: detect the cgroup hierarchy,
//! read the CPU and memory controllers, probe the host, and reconcile an
//! active processor count. Every accessor reads the cached snapshot.
//! [`OsContainer::refresh`] builds a new snapshot and swaps it in whole, so
//! concurrent readers see either the old or the new view, never a mix.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use oscontainer_common::config::ProbeConfig;
use oscontainer_common::constants::{
    CPU_WEIGHT_RANGE, DEFAULT_CPU_WEIGHT, NO_LIMIT, PER_CPU_SHARES,
};
use oscontainer_common::types::{CgroupVersion, CpuLimits, HostInfo, MemoryLimits};
use serde::Serialize;

use crate::cgroup::{self, ContainerContext};
use crate::cpuset;
use crate::host::{HostProbe, SystemHost};
use crate::processors;

/// Point-in-time view of the limits visible to the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSnapshot {
    /// Where the process sits in the cgroup hierarchy.
    pub context: ContainerContext,
    /// Raw CPU controller values.
    pub cpu: CpuLimits,
    /// Raw memory controller values.
    pub memory: MemoryLimits,
    /// Host processor information.
    pub host: HostInfo,
    /// Reconciled processor count, at least one.
    pub active_processor_count: usize,
    /// Whether a containment boundary separates the process from the host.
    pub containerized: bool,
}

impl ResourceSnapshot {
    /// Runs the detection pipeline once.
    #[must_use]
    pub fn capture(config: &ProbeConfig, host: &dyn HostProbe) -> Self {
        let context = detect_context(config);
        let cpu = cgroup::read_cpu(&context);
        let memory = cgroup::read_memory(&context, config);
        let host = host.host_info();
        let active_processor_count = processors::active_processor_count(&cpu, &host);
        let containerized = context.is_containerized();
        Self {
            context,
            cpu,
            memory,
            host,
            active_processor_count,
            containerized,
        }
    }

    /// `cpu.shares` on v1; on v2, `cpu.weight` mapped back onto the shares
    /// scale.
    ///
    /// The v2 mapping inverts the one OCI runtimes apply when translating
    /// shares to weight, then rounds results above one CPU to the nearest
    /// multiple of 1024. The default weight, and any weight the kernel
    /// would not accept, maps to `-1`.
    #[must_use]
    pub fn cpu_shares_equivalent(&self) -> i64 {
        match self.context.version {
            CgroupVersion::V2 => weight_to_shares(self.cpu.shares_or_weight),
            CgroupVersion::V1 | CgroupVersion::None => self.cpu.shares_or_weight,
        }
    }
}

fn weight_to_shares(weight: i64) -> i64 {
    if !CPU_WEIGHT_RANGE.contains(&weight) || weight == DEFAULT_CPU_WEIGHT {
        return NO_LIMIT;
    }
    let shares = (262_142 * weight - 1) / 9_999 + 2;
    if shares <= PER_CPU_SHARES {
        return shares;
    }
    let lower = shares / PER_CPU_SHARES * PER_CPU_SHARES;
    let upper = lower + PER_CPU_SHARES;
    if shares - lower <= upper - shares {
        lower
    } else {
        upper
    }
}

#[cfg(target_os = "linux")]
fn detect_context(config: &ProbeConfig) -> ContainerContext {
    cgroup::detect(config)
}

#[cfg(not(target_os = "linux"))]
fn detect_context(_config: &ProbeConfig) -> ContainerContext {
    tracing::debug!("cgroups are Linux-only, reporting host values");
    ContainerContext::none()
}

impl fmt::Display for ResourceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "active processors: {}", self.active_processor_count)?;
        writeln!(f, "container type: {}", self.context.version)?;
        writeln!(f, "memory limit (bytes): {}", self.memory.limit_bytes)?;
        writeln!(f, "memory usage (bytes): {}", self.memory.usage_bytes)?;
        writeln!(
            f,
            "quota: {}   period: {}   shares: {}",
            self.cpu.quota_micros, self.cpu.period_micros, self.cpu.shares_or_weight
        )?;
        if self.cpu.cpuset_cpus.is_empty() {
            writeln!(f, "cpuset cpus:")
        } else {
            writeln!(f, "cpuset cpus: {}", cpuset::format(&self.cpu.cpuset_cpus))
        }
    }
}

/// Resource limits of the calling process, detected once and cached.
///
/// ```no_run
/// use oscontainer_core::OsContainer;
///
/// let container = OsContainer::new();
/// let workers = container.active_processor_count();
/// ```
pub struct OsContainer {
    config: ProbeConfig,
    host: Box<dyn HostProbe>,
    snapshot: RwLock<Arc<ResourceSnapshot>>,
}

impl OsContainer {
    /// Probes the running kernel with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ProbeConfig::default(), SystemHost)
    }

    /// Probes the filesystem described by `config`, asking `host` for
    /// processor information.
    #[must_use]
    pub fn with_config(config: ProbeConfig, host: impl HostProbe + 'static) -> Self {
        let snapshot = ResourceSnapshot::capture(&config, &host);
        tracing::info!(
            version = %snapshot.context.version,
            containerized = snapshot.containerized,
            active_processors = snapshot.active_processor_count,
            memory_limit = snapshot.memory.limit_bytes,
            "resource limits detected"
        );
        Self {
            config,
            host: Box::new(host),
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ResourceSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Re-runs detection and replaces the snapshot.
    ///
    /// Readers holding the previous snapshot keep it unchanged.
    pub fn refresh(&self) {
        let fresh = Arc::new(ResourceSnapshot::capture(&self.config, self.host.as_ref()));
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if **slot != *fresh {
            tracing::info!(
                active_processors = fresh.active_processor_count,
                memory_limit = fresh.memory.limit_bytes,
                "resource limits changed"
            );
        }
        *slot = fresh;
    }

    /// Whether a cgroup boundary separates the process from the host.
    #[must_use]
    pub fn is_containerized(&self) -> bool {
        self.snapshot().containerized
    }

    /// The detected cgroup hierarchy version.
    #[must_use]
    pub fn container_type(&self) -> CgroupVersion {
        self.snapshot().context.version
    }

    /// Number of CPUs the process should assume it can use in parallel.
    #[must_use]
    pub fn active_processor_count(&self) -> usize {
        self.snapshot().active_processor_count
    }

    /// Memory limit in bytes, `-1` when unlimited or unknown.
    #[must_use]
    pub fn memory_limit_in_bytes(&self) -> i64 {
        self.snapshot().memory.limit_bytes
    }

    /// Memory usage in bytes, `0` when unknown.
    #[must_use]
    pub fn memory_usage_in_bytes(&self) -> u64 {
        self.snapshot().memory.usage_bytes
    }

    /// Raw CPU bandwidth quota in microseconds.
    #[must_use]
    pub fn cpu_quota(&self) -> i64 {
        self.snapshot().cpu.quota_micros
    }

    /// Raw CPU bandwidth period in microseconds.
    #[must_use]
    pub fn cpu_period(&self) -> i64 {
        self.snapshot().cpu.period_micros
    }

    /// Raw `cpu.shares` (v1) or `cpu.weight` (v2).
    #[must_use]
    pub fn cpu_shares(&self) -> i64 {
        self.snapshot().cpu.shares_or_weight
    }

    /// CPUs granted by the cpuset controller, empty when unset.
    #[must_use]
    pub fn cpuset_cpus(&self) -> BTreeSet<usize> {
        self.snapshot().cpu.cpuset_cpus.clone()
    }
}

impl Default for OsContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsContainer")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
