//! Host processor probing.
//!
//! Reports the online logical processor count and the calling process's
//! scheduler affinity. Query failures degrade to "all host CPUs" so the
//! processor calculation downstream always has an answer.

use std::collections::BTreeSet;

use oscontainer_common::types::HostInfo;

/// Source of host processor information.
pub trait HostProbe: Send + Sync {
    /// Online logical processors, at least one.
    fn logical_cpu_count(&self) -> usize;

    /// CPUs the scheduler lets this process run on.
    ///
    /// `None` when affinity cannot be queried or does not exclude any
    /// host CPU.
    fn affinity_mask(&self) -> Option<BTreeSet<usize>>;

    /// Both values combined.
    fn host_info(&self) -> HostInfo {
        let logical_cpu_count = self.logical_cpu_count().max(1);
        let affinity_mask = self
            .affinity_mask()
            .filter(|mask| !mask.is_empty() && mask.len() < logical_cpu_count);
        HostInfo {
            logical_cpu_count,
            affinity_mask,
        }
    }
}

/// Probes the running kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostProbe for SystemHost {
    #[cfg(target_os = "linux")]
    fn logical_cpu_count(&self) -> usize {
        use nix::unistd::{SysconfVar, sysconf};

        match sysconf(SysconfVar::_NPROCESSORS_ONLN) {
            Ok(Some(online)) => usize::try_from(online).ok().filter(|&n| n > 0).unwrap_or(1),
            Ok(None) => 1,
            Err(e) => {
                tracing::debug!(error = %e, "sysconf(_NPROCESSORS_ONLN) failed, assuming 1 CPU");
                1
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn logical_cpu_count(&self) -> usize {
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }

    #[cfg(target_os = "linux")]
    fn affinity_mask(&self) -> Option<BTreeSet<usize>> {
        use nix::sched::{CpuSet, sched_getaffinity};
        use nix::unistd::Pid;

        let set = match sched_getaffinity(Pid::from_raw(0)) {
            Ok(set) => set,
            Err(e) => {
                tracing::debug!(error = %e, "sched_getaffinity failed");
                return None;
            }
        };
        let mask: BTreeSet<usize> = (0..CpuSet::count())
            .filter(|&cpu| set.is_set(cpu).unwrap_or(false))
            .collect();
        let logical = self.logical_cpu_count();
        if mask.is_empty() || mask.len() >= logical {
            return None;
        }
        tracing::trace!(cpus = mask.len(), logical, "process affinity narrows host CPUs");
        Some(mask)
    }

    #[cfg(not(target_os = "linux"))]
    fn affinity_mask(&self) -> Option<BTreeSet<usize>> {
        None
    }
}

/// A host with fixed, caller-supplied values.
///
/// Useful for sizing decisions made on behalf of another machine and for
/// exercising the detection pipeline without touching the real kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedHost {
    info: HostInfo,
}

impl FixedHost {
    /// A host with `logical_cpu_count` CPUs and no affinity restriction.
    #[must_use]
    pub fn new(logical_cpu_count: usize) -> Self {
        Self {
            info: HostInfo::unrestricted(logical_cpu_count),
        }
    }

    /// Restricts the process to `mask`.
    #[must_use]
    pub fn with_affinity(mut self, mask: impl IntoIterator<Item = usize>) -> Self {
        self.info.affinity_mask = Some(mask.into_iter().collect());
        self
    }
}

impl HostProbe for FixedHost {
    fn logical_cpu_count(&self) -> usize {
        self.info.logical_cpu_count
    }

    fn affinity_mask(&self) -> Option<BTreeSet<usize>> {
        self.info.affinity_mask.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_host_reports_at_least_one_cpu() {
        let info = SystemHost.host_info();
        assert!(info.logical_cpu_count >= 1);
    }

    #[test]
    fn online_count_covers_available_parallelism() {
        let parallelism =
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        assert!(SystemHost.logical_cpu_count() >= parallelism);
    }

    #[test]
    fn system_affinity_never_exceeds_host() {
        let info = SystemHost.host_info();
        if let Some(mask) = info.affinity_mask {
            assert!(!mask.is_empty());
            assert!(mask.len() < info.logical_cpu_count);
        }
    }

    #[test]
    fn fixed_host_without_affinity() {
        let info = FixedHost::new(4).host_info();
        assert_eq!(info.logical_cpu_count, 4);
        assert_eq!(info.affinity_mask, None);
    }

    #[test]
    fn full_affinity_carries_no_restriction() {
        let info = FixedHost::new(4).with_affinity(0..4).host_info();
        assert_eq!(info.affinity_mask, None);
    }

    #[test]
    fn empty_affinity_is_dropped() {
        let info = FixedHost::new(4).with_affinity(Vec::new()).host_info();
        assert_eq!(info.affinity_mask, None);
    }

    #[test]
    fn partial_affinity_is_kept() {
        let info = FixedHost::new(8).with_affinity([1, 3]).host_info();
        assert_eq!(info.affinity_mask, Some([1, 3].into_iter().collect()));
    }

    #[test]
    fn zero_cpu_host_is_clamped() {
        assert_eq!(FixedHost::new(0).host_info().logical_cpu_count, 1);
    }
}
