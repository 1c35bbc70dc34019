//! Kernel interface paths, control file names, and sentinel values.

/// Sentinel for "no limit" on signed limit fields.
pub const NO_LIMIT: i64 = -1;

/// cgroup v1 `cpu.shares` value that corresponds to one CPU.
pub const PER_CPU_SHARES: i64 = 1024;

/// Default cgroup v2 `cpu.weight`.
pub const DEFAULT_CPU_WEIGHT: i64 = 100;

/// Range the kernel accepts for cgroup v2 `cpu.weight`.
pub const CPU_WEIGHT_RANGE: std::ops::RangeInclusive<i64> = 1..=10_000;

/// Upper bound on CPU indices accepted from range lists.
///
/// The kernel's `NR_CPUS` cannot be configured above 8192.
pub const MAX_CPUS: usize = 8192;

/// The calling process's cgroup membership.
pub const PROC_SELF_CGROUP: &str = "/proc/self/cgroup";

/// The calling process's mount table.
pub const PROC_SELF_MOUNTINFO: &str = "/proc/self/mountinfo";

/// Kernel table of cgroup controllers with hierarchy ids and enabled flags.
pub const PROC_CGROUPS: &str = "/proc/cgroups";

/// Conventional cgroup filesystem mount point.
pub const CGROUP_V2_PATH: &str = "/sys/fs/cgroup";

/// Filesystem type of legacy per-controller hierarchies.
pub const CGROUP_FS_V1: &str = "cgroup";

/// Filesystem type of the unified hierarchy.
pub const CGROUP_FS_V2: &str = "cgroup2";

/// Smallest v1 `memory.limit_in_bytes` treated as "no limit".
///
/// The kernel reports an unset limit as `LONG_MAX` rounded down to the page
/// size (older kernels report `ULLONG_MAX`). This is `LONG_MAX` rounded
/// down to 64 KiB, the largest page size in common use, so every page size
/// up to 64 KiB lands at or above it. It is a heuristic, not a kernel contract.
pub const V1_UNLIMITED_THRESHOLD: u64 = 0x7FFF_FFFF_FFFF_0000;

/// v1 CPU bandwidth quota in microseconds, `-1` when unset.
pub const CPU_CFS_QUOTA_US: &str = "cpu.cfs_quota_us";
/// v1 CPU bandwidth period in microseconds.
pub const CPU_CFS_PERIOD_US: &str = "cpu.cfs_period_us";
/// v1 relative CPU weight.
pub const CPU_SHARES: &str = "cpu.shares";
/// v1 (and v2 fallback) requested cpuset.
pub const CPUSET_CPUS: &str = "cpuset.cpus";
/// v1 memory limit in bytes.
pub const MEMORY_LIMIT_IN_BYTES: &str = "memory.limit_in_bytes";
/// v1 memory usage in bytes.
pub const MEMORY_USAGE_IN_BYTES: &str = "memory.usage_in_bytes";
/// v1 hierarchical accounting flag.
pub const MEMORY_USE_HIERARCHY: &str = "memory.use_hierarchy";
/// v1 memory statistics, carries `hierarchical_memory_limit`.
pub const MEMORY_STAT: &str = "memory.stat";

/// v2 CPU bandwidth, `"<quota|max> <period>"`.
pub const CPU_MAX: &str = "cpu.max";
/// v2 relative CPU weight.
pub const CPU_WEIGHT: &str = "cpu.weight";
/// v2 cpuset granted after parent restriction.
pub const CPUSET_CPUS_EFFECTIVE: &str = "cpuset.cpus.effective";
/// v2 memory limit in bytes or `max`.
pub const MEMORY_MAX: &str = "memory.max";
/// v2 memory usage in bytes.
pub const MEMORY_CURRENT: &str = "memory.current";

/// Environment variable overriding the filesystem root used for probing.
pub const ROOT_ENV: &str = "OSCONTAINER_ROOT";
