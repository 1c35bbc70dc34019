//! cgroup v1 controller readers.
//!
//! Each controller lives in its own hierarchy, so CPU bandwidth, cpuset and
//! memory files are read from separate directories.

use std::path::{Path, PathBuf};

use oscontainer_common::constants::{
    CPU_CFS_PERIOD_US, CPU_CFS_QUOTA_US, CPU_SHARES, CPUSET_CPUS, MEMORY_LIMIT_IN_BYTES,
    MEMORY_STAT, MEMORY_USAGE_IN_BYTES, MEMORY_USE_HIERARCHY, NO_LIMIT,
};
use oscontainer_common::error::{OsContainerError, Result};
use oscontainer_common::types::{Controller, CpuLimits, MemoryLimits};

use super::ContainerContext;
use super::io::{or_sentinel, read_keyed, read_number, read_trimmed};
use crate::cpuset;

fn controller_file(
    context: &ContainerContext,
    controller: Controller,
    file: &str,
) -> Result<PathBuf> {
    context
        .controller_dir(controller)
        .map(|dir| dir.join(file))
        .ok_or_else(|| OsContainerError::Unsupported {
            message: format!("{controller} controller not mounted"),
        })
}

fn read_i64(context: &ContainerContext, controller: Controller, file: &str) -> i64 {
    or_sentinel(
        controller_file(context, controller, file).and_then(|path| read_number(&path)),
        NO_LIMIT,
    )
}

/// Reads `cpu.cfs_quota_us`, `cpu.cfs_period_us`, `cpu.shares` and
/// `cpuset.cpus`.
///
/// Values are reported as the kernel wrote them; `cpu.shares` keeps its
/// default of 1024 rather than being mapped to "unset".
#[must_use]
pub fn read_cpu(context: &ContainerContext) -> CpuLimits {
    let cpuset_cpus = or_sentinel(
        controller_file(context, Controller::Cpuset, CPUSET_CPUS)
            .and_then(|path| read_trimmed(&path))
            .map(|list| cpuset::parse(&list)),
        Default::default(),
    );
    let limits = CpuLimits {
        quota_micros: read_i64(context, Controller::Cpu, CPU_CFS_QUOTA_US),
        period_micros: read_i64(context, Controller::Cpu, CPU_CFS_PERIOD_US),
        shares_or_weight: read_i64(context, Controller::Cpu, CPU_SHARES),
        cpuset_cpus,
    };
    tracing::trace!(?limits, "cgroup v1 cpu limits");
    limits
}

/// Reads `memory.limit_in_bytes` and `memory.usage_in_bytes`.
///
/// A limit at or above `unlimited_threshold` is the kernel's way of saying
/// "no limit". In that case, when hierarchical accounting is on, the
/// `hierarchical_memory_limit` inherited from an ancestor is used instead
/// if it is a real limit.
#[must_use]
pub fn read_memory(context: &ContainerContext, unlimited_threshold: u64) -> MemoryLimits {
    let Some(dir) = context.controller_dir(Controller::Memory) else {
        return MemoryLimits::default();
    };
    let limit = or_sentinel(
        read_number::<u64>(&dir.join(MEMORY_LIMIT_IN_BYTES)).map(Some),
        None,
    );
    let limit_bytes = match limit {
        Some(bytes) if bytes < unlimited_threshold => to_limit(bytes),
        Some(_) => hierarchical_limit(dir, unlimited_threshold),
        None => NO_LIMIT,
    };
    let usage_bytes = or_sentinel(read_number(&dir.join(MEMORY_USAGE_IN_BYTES)), 0);
    let limits = MemoryLimits {
        limit_bytes,
        usage_bytes,
    };
    tracing::trace!(?limits, "cgroup v1 memory limits");
    limits
}

fn hierarchical_limit(dir: &Path, unlimited_threshold: u64) -> i64 {
    let use_hierarchy = or_sentinel(read_number::<u64>(&dir.join(MEMORY_USE_HIERARCHY)), 0);
    if use_hierarchy == 0 {
        return NO_LIMIT;
    }
    let inherited = or_sentinel(
        read_keyed::<u64>(&dir.join(MEMORY_STAT), "hierarchical_memory_limit").map(Some),
        None,
    );
    match inherited {
        Some(bytes) if bytes < unlimited_threshold => {
            tracing::debug!(bytes, "using hierarchical memory limit");
            to_limit(bytes)
        }
        _ => NO_LIMIT,
    }
}

fn to_limit(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(NO_LIMIT)
}
