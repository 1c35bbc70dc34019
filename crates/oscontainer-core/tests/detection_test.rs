//! End-to-end detection tests against fake `/proc` and `/sys/fs/cgroup`
//! trees.
//!
//! Each test lays out the kernel files a real host or container would expose
//! under a temporary root and runs the full [`OsContainer`] pipeline:
//! 1. Controller table and membership parsing
//! 2. Mount table resolution
//! 3. v1 and v2 controller reads
//! 4. Processor reconciliation
//! 5. Snapshot refresh

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use oscontainer_common::config::ProbeConfig;
use oscontainer_common::types::CgroupVersion;
use oscontainer_core::{FixedHost, OsContainer};

/// A temporary filesystem root holding kernel interface files.
struct FakeRoot {
    dir: tempfile::TempDir,
}

impl FakeRoot {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn write(&self, path: &str, content: &str) -> &Self {
        let full = self.dir.path().join(path.trim_start_matches('/'));
        std::fs::create_dir_all(full.parent().expect("parent")).expect("create dirs");
        std::fs::write(full, content).expect("write fixture");
        self
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn container(&self, host: FixedHost) -> OsContainer {
        OsContainer::with_config(ProbeConfig::with_root(self.path()), host)
    }
}

// ── cgroup v1 ────────────────────────────────────────────────────────

const V1_PROC_CGROUPS: &str = "\
#subsys_name\thierarchy\tnum_cgroups\tenabled
cpuset\t3\t4\t1
cpu\t4\t60\t1
cpuacct\t4\t60\t1
memory\t5\t90\t1
pids\t6\t70\t1
";

const V1_SELF_CGROUP: &str = "\
6:pids:/docker/4bb4
5:memory:/docker/4bb4
4:cpu,cpuacct:/docker/4bb4
3:cpuset:/docker/4bb4
1:name=systemd:/docker/4bb4
";

const V1_MOUNTINFO: &str = "\
610 602 0:26 /docker/4bb4 /sys/fs/cgroup/cpuset ro,nosuid,nodev,noexec,relatime master:9 - cgroup cgroup rw,cpuset
611 602 0:27 /docker/4bb4 /sys/fs/cgroup/cpu,cpuacct ro,nosuid,nodev,noexec,relatime master:10 - cgroup cgroup rw,cpu,cpuacct
612 602 0:28 /docker/4bb4 /sys/fs/cgroup/memory ro,nosuid,nodev,noexec,relatime master:11 - cgroup cgroup rw,memory
613 602 0:29 /docker/4bb4 /sys/fs/cgroup/pids ro,nosuid,nodev,noexec,relatime master:12 - cgroup cgroup rw,pids
";

fn docker_v1() -> FakeRoot {
    let root = FakeRoot::new();
    let _ = root
        .write("/proc/cgroups", V1_PROC_CGROUPS)
        .write("/proc/self/cgroup", V1_SELF_CGROUP)
        .write("/proc/self/mountinfo", V1_MOUNTINFO)
        .write("/sys/fs/cgroup/cpu,cpuacct/cpu.cfs_quota_us", "150000\n")
        .write("/sys/fs/cgroup/cpu,cpuacct/cpu.cfs_period_us", "100000\n")
        .write("/sys/fs/cgroup/cpu,cpuacct/cpu.shares", "1024\n")
        .write("/sys/fs/cgroup/cpuset/cpuset.cpus", "0-2\n")
        .write("/sys/fs/cgroup/memory/memory.limit_in_bytes", "536870912\n")
        .write("/sys/fs/cgroup/memory/memory.usage_in_bytes", "12582912\n");
    root
}

#[test]
fn v1_docker_container_reports_limits() {
    let root = docker_v1();
    let container = root.container(FixedHost::new(8));

    assert!(container.is_containerized());
    assert_eq!(container.container_type(), CgroupVersion::V1);
    assert_eq!(container.cpu_quota(), 150_000);
    assert_eq!(container.cpu_period(), 100_000);
    assert_eq!(container.cpu_shares(), 1024);
    assert_eq!(container.cpuset_cpus(), [0, 1, 2].into_iter().collect());
    assert_eq!(container.memory_limit_in_bytes(), 536_870_912);
    assert_eq!(container.memory_usage_in_bytes(), 12_582_912);
    // quota allows 2 CPUs, cpuset 3
    assert_eq!(container.active_processor_count(), 2);
    assert_eq!(container.snapshot().context.cgroup_path, "/docker/4bb4");
}

#[test]
fn v1_unlimited_memory_reports_no_limit() {
    let root = docker_v1();
    let _ = root.write(
        "/sys/fs/cgroup/memory/memory.limit_in_bytes",
        "9223372036854771712\n",
    );
    let container = root.container(FixedHost::new(8));
    assert_eq!(container.memory_limit_in_bytes(), -1);
}

#[test]
fn v1_without_controller_table_uses_membership() {
    let root = FakeRoot::new();
    let _ = root
        .write("/proc/self/cgroup", V1_SELF_CGROUP)
        .write("/proc/self/mountinfo", V1_MOUNTINFO)
        .write("/sys/fs/cgroup/cpuset/cpuset.cpus", "1,3\n");
    let container = root.container(FixedHost::new(4));
    assert_eq!(container.container_type(), CgroupVersion::V1);
    assert_eq!(container.active_processor_count(), 2);
}

#[test]
fn v1_disabled_memory_controller_detects_none() {
    let root = docker_v1();
    let _ = root.write(
        "/proc/cgroups",
        &V1_PROC_CGROUPS.replace("memory\t5\t90\t1", "memory\t5\t90\t0"),
    );
    let container = root.container(FixedHost::new(8));
    assert_eq!(container.container_type(), CgroupVersion::None);
    assert!(!container.is_containerized());
    assert_eq!(container.active_processor_count(), 8);
}

#[test]
fn v1_missing_required_mount_detects_none() {
    let root = docker_v1();
    let mountinfo: String = V1_MOUNTINFO
        .lines()
        .filter(|line| !line.contains("rw,memory"))
        .map(|line| format!("{line}\n"))
        .collect();
    let _ = root.write("/proc/self/mountinfo", &mountinfo);
    let container = root.container(FixedHost::new(8));
    assert_eq!(container.container_type(), CgroupVersion::None);
}

#[test]
fn v1_prefers_conventional_cpuset_mount() {
    let root = docker_v1();
    let mountinfo = format!(
        "500 1 0:40 / /dev/cpuset rw,relatime - cgroup none rw,cpuset\n{V1_MOUNTINFO}"
    );
    let _ = root
        .write("/proc/self/mountinfo", &mountinfo)
        .write("/dev/cpuset/docker/4bb4/cpuset.cpus", "0\n");
    let container = root.container(FixedHost::new(8));
    assert_eq!(container.cpuset_cpus().len(), 3);
}

#[test]
fn v1_host_root_cgroup_is_not_containerized() {
    let root = FakeRoot::new();
    let _ = root
        .write("/proc/cgroups", V1_PROC_CGROUPS)
        .write(
            "/proc/self/cgroup",
            "5:memory:/\n4:cpu,cpuacct:/\n3:cpuset:/\n",
        )
        .write(
            "/proc/self/mountinfo",
            &V1_MOUNTINFO.replace("/docker/4bb4 /sys", "/ /sys"),
        )
        .write("/sys/fs/cgroup/cpu,cpuacct/cpu.cfs_quota_us", "-1\n");
    let container = root.container(FixedHost::new(4));
    assert_eq!(container.container_type(), CgroupVersion::V1);
    assert!(!container.is_containerized());
    assert_eq!(container.cpu_quota(), -1);
    assert_eq!(container.active_processor_count(), 4);
}

// ── cgroup v2 ────────────────────────────────────────────────────────

const V2_PROC_CGROUPS: &str = "\
#subsys_name\thierarchy\tnum_cgroups\tenabled
cpuset\t0\t120\t1
cpu\t0\t120\t1
cpuacct\t0\t120\t1
memory\t0\t120\t1
pids\t0\t120\t1
";

const V2_MOUNTINFO: &str = "\
1100 1090 0:30 / /sys/fs/cgroup ro,nosuid,nodev,noexec,relatime - cgroup2 cgroup rw,nsdelegate,memory_recursiveprot
1101 1090 0:31 / /proc rw,nosuid,nodev,noexec,relatime - proc proc rw
";

fn namespaced_v2() -> FakeRoot {
    let root = FakeRoot::new();
    let _ = root
        .write("/proc/cgroups", V2_PROC_CGROUPS)
        .write("/proc/self/cgroup", "0::/\n")
        .write("/proc/self/mountinfo", V2_MOUNTINFO)
        .write("/sys/fs/cgroup/cpu.max", "50000 100000\n")
        .write("/sys/fs/cgroup/cpu.weight", "100\n")
        .write("/sys/fs/cgroup/cpuset.cpus.effective", "0-7\n")
        .write("/sys/fs/cgroup/memory.max", "1073741824\n")
        .write("/sys/fs/cgroup/memory.current", "4096000\n");
    root
}

#[test]
fn v2_namespaced_container_reports_limits() {
    let root = namespaced_v2();
    let container = root.container(FixedHost::new(8));

    assert_eq!(container.container_type(), CgroupVersion::V2);
    assert!(container.is_containerized());
    assert_eq!(container.cpu_quota(), 50_000);
    assert_eq!(container.cpu_period(), 100_000);
    assert_eq!(container.cpu_shares(), 100);
    assert_eq!(container.cpuset_cpus().len(), 8);
    assert_eq!(container.memory_limit_in_bytes(), 1_073_741_824);
    assert_eq!(container.memory_usage_in_bytes(), 4_096_000);
    assert_eq!(container.active_processor_count(), 1);
    assert_eq!(container.snapshot().cpu_shares_equivalent(), -1);
}

#[test]
fn v2_nested_cgroup_appends_path() {
    let root = FakeRoot::new();
    let _ = root
        .write("/proc/cgroups", V2_PROC_CGROUPS)
        .write("/proc/self/cgroup", "0::/kubepods/pod1/ctr\n")
        .write("/proc/self/mountinfo", V2_MOUNTINFO)
        .write("/sys/fs/cgroup/kubepods/pod1/ctr/cpu.max", "max 100000\n")
        .write("/sys/fs/cgroup/kubepods/pod1/ctr/memory.max", "max\n")
        .write("/sys/fs/cgroup/kubepods/pod1/ctr/cpuset.cpus.effective", "2-3\n");
    let container = root.container(FixedHost::new(16));

    assert!(container.is_containerized());
    assert_eq!(container.cpu_quota(), -1);
    assert_eq!(container.cpu_period(), 100_000);
    assert_eq!(container.memory_limit_in_bytes(), -1);
    assert_eq!(container.active_processor_count(), 2);
    assert_eq!(
        container.snapshot().context.cgroup_path,
        "/kubepods/pod1/ctr"
    );
}

#[test]
fn v2_host_root_is_not_containerized() {
    let root = FakeRoot::new();
    let _ = root
        .write("/proc/cgroups", V2_PROC_CGROUPS)
        .write("/proc/self/cgroup", "0::/\n")
        .write("/proc/self/mountinfo", V2_MOUNTINFO)
        .write("/sys/fs/cgroup/cpuset.cpus.effective", "0-3\n");
    let container = root.container(FixedHost::new(4));

    assert_eq!(container.container_type(), CgroupVersion::V2);
    assert!(!container.is_containerized());
    assert_eq!(container.memory_limit_in_bytes(), -1);
    assert_eq!(container.active_processor_count(), 4);
}

#[test]
fn v2_affinity_narrows_count() {
    let root = namespaced_v2();
    let _ = root.write("/sys/fs/cgroup/cpu.max", "max 100000\n");
    let container = root.container(FixedHost::new(8).with_affinity([0, 1, 2]));
    assert_eq!(container.active_processor_count(), 3);
}

#[test]
fn v2_malformed_files_fall_back_to_sentinels() {
    let root = namespaced_v2();
    let _ = root
        .write("/sys/fs/cgroup/cpu.max", "unbounded\n")
        .write("/sys/fs/cgroup/memory.max", "a lot\n")
        .write("/sys/fs/cgroup/memory.current", "\n");
    let container = root.container(FixedHost::new(8));

    assert!(container.is_containerized());
    assert_eq!(container.cpu_quota(), -1);
    assert_eq!(container.cpu_period(), -1);
    assert_eq!(container.memory_limit_in_bytes(), -1);
    assert_eq!(container.memory_usage_in_bytes(), 0);
    assert_eq!(container.active_processor_count(), 8);
}

#[test]
fn v2_out_of_range_weight_has_no_shares_equivalent() {
    let root = namespaced_v2();
    let _ = root.write("/sys/fs/cgroup/cpu.weight", "99999999999999999\n");
    let container = root.container(FixedHost::new(8));
    assert_eq!(container.cpu_shares(), 99_999_999_999_999_999);
    assert_eq!(container.snapshot().cpu_shares_equivalent(), -1);
}

// ── No cgroups ───────────────────────────────────────────────────────

#[test]
fn empty_root_reports_host_defaults() {
    let root = FakeRoot::new();
    let container = root.container(FixedHost::new(12));

    assert_eq!(container.container_type(), CgroupVersion::None);
    assert!(!container.is_containerized());
    assert_eq!(container.active_processor_count(), 12);
    assert_eq!(container.memory_limit_in_bytes(), -1);
    assert_eq!(container.memory_usage_in_bytes(), 0);
}

#[test]
fn garbage_proc_files_report_host_defaults() {
    let root = FakeRoot::new();
    let _ = root
        .write("/proc/self/cgroup", "this is not a cgroup file\n")
        .write("/proc/self/mountinfo", "nor is this a mount table\n");
    let container = root.container(FixedHost::new(2));
    assert_eq!(container.container_type(), CgroupVersion::None);
    assert_eq!(container.active_processor_count(), 2);
}

// ── Refresh ──────────────────────────────────────────────────────────

#[test]
fn refresh_picks_up_changed_limits() {
    let root = namespaced_v2();
    let container = root.container(FixedHost::new(8));
    let before = container.snapshot();
    assert_eq!(before.active_processor_count, 1);

    let _ = root
        .write("/sys/fs/cgroup/cpu.max", "400000 100000\n")
        .write("/sys/fs/cgroup/memory.max", "max\n");
    container.refresh();

    assert_eq!(container.active_processor_count(), 4);
    assert_eq!(container.memory_limit_in_bytes(), -1);
    assert_eq!(before.active_processor_count, 1);
    assert_eq!(before.memory.limit_bytes, 1_073_741_824);
}

#[test]
fn dump_reflects_detected_limits() {
    let root = docker_v1();
    let container = root.container(FixedHost::new(8));
    let dump = container.snapshot().to_string();
    assert_eq!(
        dump,
        "active processors: 2\n\
         container type: v1\n\
         memory limit (bytes): 536870912\n\
         memory usage (bytes): 12582912\n\
         quota: 150000   period: 100000   shares: 1024\n\
         cpuset cpus: 0-2\n"
    );
}
