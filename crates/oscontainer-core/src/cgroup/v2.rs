//! cgroup v2 (unified hierarchy) readers.

use std::collections::BTreeSet;
use std::path::Path;

use oscontainer_common::constants::{
    CPU_MAX, CPU_WEIGHT, CPUSET_CPUS, CPUSET_CPUS_EFFECTIVE, MEMORY_CURRENT, MEMORY_MAX,
    NO_LIMIT,
};
use oscontainer_common::error::{OsContainerError, Result};
use oscontainer_common::types::{Controller, CpuLimits, MemoryLimits};

use super::ContainerContext;
use super::io::{or_sentinel, parse_limit, parse_value, read_limit, read_number, read_trimmed};
use crate::cpuset;

/// Parses `cpu.max`: `"<quota> <period>"`, quota `max` when unlimited.
///
/// # Errors
///
/// Returns [`OsContainerError::Parse`] unless the content is exactly two
/// fields with a valid quota and period.
pub fn parse_cpu_max(path: &Path, content: &str) -> Result<(i64, i64)> {
    let mut fields = content.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(quota), Some(period), None) => {
            Ok((parse_limit(path, quota)?, parse_value(path, period)?))
        }
        _ => Err(OsContainerError::parse(
            path,
            format!("expected \"<quota> <period>\", got {content:?}"),
        )),
    }
}

/// Reads `cpu.max`, `cpu.weight` and the effective cpuset.
///
/// `cpu.weight` is reported raw (1..=10000, default 100). The cpuset comes
/// from `cpuset.cpus.effective`, falling back to `cpuset.cpus` when the
/// former is absent or empty.
#[must_use]
pub fn read_cpu(context: &ContainerContext) -> CpuLimits {
    let Some(dir) = context.controller_dir(Controller::Cpu) else {
        return CpuLimits::default();
    };

    let cpu_max = dir.join(CPU_MAX);
    let (quota_micros, period_micros) = or_sentinel(
        read_trimmed(&cpu_max).and_then(|content| parse_cpu_max(&cpu_max, &content)),
        (NO_LIMIT, NO_LIMIT),
    );

    let limits = CpuLimits {
        quota_micros,
        period_micros,
        shares_or_weight: or_sentinel(read_number(&dir.join(CPU_WEIGHT)), NO_LIMIT),
        cpuset_cpus: read_cpuset(dir),
    };
    tracing::trace!(?limits, "cgroup v2 cpu limits");
    limits
}

fn read_cpuset(dir: &Path) -> BTreeSet<usize> {
    for file in [CPUSET_CPUS_EFFECTIVE, CPUSET_CPUS] {
        let cpus = or_sentinel(
            read_trimmed(&dir.join(file)).map(|list| cpuset::parse(&list)),
            BTreeSet::new(),
        );
        if !cpus.is_empty() {
            return cpus;
        }
    }
    BTreeSet::new()
}

/// Reads `memory.max` and `memory.current`.
#[must_use]
pub fn read_memory(context: &ContainerContext) -> MemoryLimits {
    let Some(dir) = context.controller_dir(Controller::Memory) else {
        return MemoryLimits::default();
    };
    let limits = MemoryLimits {
        limit_bytes: or_sentinel(read_limit(&dir.join(MEMORY_MAX)), NO_LIMIT),
        usage_bytes: or_sentinel(read_number(&dir.join(MEMORY_CURRENT)), 0),
    };
    tracing::trace!(?limits, "cgroup v2 memory limits");
    limits
}
