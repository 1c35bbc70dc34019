//! # oscontainer-core
//!
//! Determines the CPU and memory limits actually visible to a Linux
//! process, accounting for cgroup constraints tighter than the host.
//!
//! This crate provides:
//! - **Range lists**: the kernel's `0-2,4` CPU list syntax, both directions.
//! - **Host probe**: online processor count and scheduler affinity.
//! - **Cgroups**: v1/v2 detection and controller file readers.
//! - **Processors**: reconciliation of cpuset, quota and affinity into one count.
//! - **Container**: the [`OsContainer`] facade and its cached [`ResourceSnapshot`].
//!
//! Detection never fails. Missing, unreadable, or malformed kernel files
//! degrade to sentinel values and, at worst, to host-wide defaults.

pub mod cgroup;
pub mod container;
pub mod cpuset;
pub mod host;
pub mod processors;

pub use container::{OsContainer, ResourceSnapshot};
pub use host::{FixedHost, HostProbe, SystemHost};
