//! Formatting helpers for the human-readable report.

use std::collections::BTreeSet;

use oscontainer_core::cpuset;

/// Formats a byte count into a human-readable string (e.g., "128.0 MiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Formats a memory limit, where any negative value means unlimited.
#[must_use]
pub fn format_limit(limit_bytes: i64) -> String {
    u64::try_from(limit_bytes).map_or_else(|_| String::from("unlimited"), format_bytes)
}

/// Formats a scheduler affinity mask; `None` means every host CPU.
#[must_use]
pub fn format_affinity(mask: Option<&BTreeSet<usize>>) -> String {
    mask.map_or_else(|| String::from("all"), cpuset::format)
}
