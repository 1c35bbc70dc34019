//! Active processor count reconciliation.
//!
//! Starts from what the host scheduler grants the process and narrows it by
//! the cgroup cpuset and the CPU bandwidth quota. No step can widen the
//! count, and the result is never below one. Shares and weights express
//! priority under contention rather than a cap, so they are ignored here.

use oscontainer_common::types::{CpuLimits, HostInfo};

/// Number of CPUs an application should assume it can use in parallel.
#[must_use]
pub fn active_processor_count(cpu: &CpuLimits, host: &HostInfo) -> usize {
    let mut available = host
        .affinity_mask
        .as_ref()
        .map_or(host.logical_cpu_count, |mask| mask.len());

    if !cpu.cpuset_cpus.is_empty() {
        // A stale cpuset can list CPUs the host no longer exposes. The host
        // range is taken as 0..online count, so with offline CPUs in the
        // middle of the numbering, high-numbered online CPUs are not counted
        // and the result errs low.
        let granted = cpu
            .cpuset_cpus
            .iter()
            .filter(|&&index| index < host.logical_cpu_count)
            .count();
        available = available.min(granted);
    }

    if let Some(quota_cpus) = cpu.quota_cpus() {
        available = available.min(quota_cpus);
    }

    let count = available.max(1);
    tracing::debug!(
        logical = host.logical_cpu_count,
        affinity = host.affinity_mask.as_ref().map(|mask| mask.len()),
        cpuset = cpu.cpuset_cpus.len(),
        quota_cpus = cpu.quota_cpus(),
        count,
        "active processor count"
    );
    count
}
