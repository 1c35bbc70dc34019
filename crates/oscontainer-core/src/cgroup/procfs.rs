//! Parsers for `/proc/self/mountinfo`, `/proc/self/cgroup` and `/proc/cgroups`.
//!
//! Lines that do not match the documented layout are skipped; only a
//! failure to read the file itself is reported.

use std::path::Path;

use nom::{
    IResult, Parser,
    bytes::complete::{take_till, take_till1},
    character::complete::{char, digit1, space0, space1},
    combinator::{map_res, rest},
    multi::many_till,
    sequence::{preceded, terminated},
};

use oscontainer_common::constants::{CGROUP_FS_V1, CGROUP_FS_V2};
use oscontainer_common::error::Result;
use oscontainer_common::types::Controller;

use super::io::read_trimmed;

/// One line of `/proc/self/mountinfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    /// Directory of the mounted filesystem that forms the mount's root.
    pub root: String,
    /// Where the mount is attached, relative to the process's root.
    pub mount_point: String,
    /// Filesystem type, e.g. `cgroup2`.
    pub fs_type: String,
    /// Per-superblock options; lists the controllers of a v1 hierarchy.
    pub super_options: String,
}

impl MountInfo {
    /// Whether this is a legacy per-controller hierarchy.
    #[must_use]
    pub fn is_cgroup_v1(&self) -> bool {
        self.fs_type == CGROUP_FS_V1
    }

    /// Whether this is the unified hierarchy.
    #[must_use]
    pub fn is_cgroup_v2(&self) -> bool {
        self.fs_type == CGROUP_FS_V2
    }

    /// Controllers attached to a v1 hierarchy.
    pub fn controllers(&self) -> impl Iterator<Item = Controller> + '_ {
        self.super_options.split(',').filter_map(Controller::from_name)
    }
}

/// One line of `/proc/self/cgroup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupMembership {
    /// Hierarchy id; `0` is the unified hierarchy.
    pub hierarchy_id: u32,
    /// Controllers bound to the hierarchy, empty for v2.
    pub controllers: Vec<String>,
    /// Path of the process's cgroup within the hierarchy.
    pub path: String,
}

impl CgroupMembership {
    /// Whether `controller` is bound to this hierarchy.
    #[must_use]
    pub fn has(&self, controller: Controller) -> bool {
        self.controllers.iter().any(|c| c == controller.as_str())
    }
}

/// One row of `/proc/cgroups`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    /// Controller the row describes.
    pub controller: Controller,
    /// Hierarchy id, `0` when bound to the unified hierarchy.
    pub hierarchy_id: u32,
    /// Whether the kernel has the controller enabled.
    pub enabled: bool,
}

/// A whitespace-delimited field.
fn field(input: &str) -> IResult<&str, &str> {
    preceded(space0, take_till1(|c: char| c.is_ascii_whitespace())).parse(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(preceded(space0, digit1), str::parse::<u32>).parse(input)
}

/// The lone `-` ending the optional fields of a mountinfo line.
fn optional_fields_end(input: &str) -> IResult<&str, char> {
    preceded(space1, terminated(char('-'), space1)).parse(input)
}

fn mountinfo_line(input: &str) -> IResult<&str, MountInfo> {
    let (input, _mount_id) = field(input)?;
    let (input, _parent_id) = field(input)?;
    let (input, _major_minor) = field(input)?;
    let (input, root) = field(input)?;
    let (input, mount_point) = field(input)?;
    let (input, _options) = field(input)?;
    let (input, _) = many_till(field, optional_fields_end).parse(input)?;
    let (input, fs_type) = field(input)?;
    let (input, _source) = field(input)?;
    let (input, super_options) = field(input)?;
    Ok((
        input,
        MountInfo {
            root: unescape(root),
            mount_point: unescape(mount_point),
            fs_type: fs_type.to_owned(),
            super_options: super_options.to_owned(),
        },
    ))
}

fn self_cgroup_line(input: &str) -> IResult<&str, CgroupMembership> {
    let (input, hierarchy_id) = number(input)?;
    let (input, _) = char(':').parse(input)?;
    let (input, controllers) = take_till(|c: char| c == ':').parse(input)?;
    let (input, _) = char(':').parse(input)?;
    let (input, path) = rest.parse(input)?;
    Ok((
        input,
        CgroupMembership {
            hierarchy_id,
            controllers: controllers
                .split(',')
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect(),
            path: path.trim().to_owned(),
        },
    ))
}

fn proc_cgroups_line(input: &str) -> IResult<&str, (&str, u32, bool)> {
    let (input, name) = field(input)?;
    let (input, hierarchy_id) = number(input)?;
    let (input, _num_cgroups) = number(input)?;
    let (input, enabled) = number(input)?;
    Ok((input, (name, hierarchy_id, enabled != 0)))
}

/// Decodes the octal escapes (`\040` for space) the kernel uses in paths.
fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_owned();
    }
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 4])
                .ok()
                .and_then(|digits| u8::from_str_radix(digits, 8).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses mountinfo content.
#[must_use]
pub fn parse_mountinfo(content: &str) -> Vec<MountInfo> {
    content
        .lines()
        .filter_map(|line| mountinfo_line(line).ok().map(|(_, mount)| mount))
        .collect()
}

/// Parses `/proc/self/cgroup` content.
#[must_use]
pub fn parse_self_cgroup(content: &str) -> Vec<CgroupMembership> {
    content
        .lines()
        .filter_map(|line| self_cgroup_line(line).ok().map(|(_, entry)| entry))
        .collect()
}

/// Parses `/proc/cgroups` content, keeping the controllers detection uses.
#[must_use]
pub fn parse_proc_cgroups(content: &str) -> Vec<ControllerStatus> {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| proc_cgroups_line(line).ok())
        .filter_map(|(_, (name, hierarchy_id, enabled))| {
            Controller::from_name(name).map(|controller| ControllerStatus {
                controller,
                hierarchy_id,
                enabled,
            })
        })
        .collect()
}

/// Reads and parses a mountinfo file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_mountinfo(path: &Path) -> Result<Vec<MountInfo>> {
    tracing::debug!(path = %path.display(), "reading mountinfo");
    read_trimmed(path).map(|content| parse_mountinfo(&content))
}

/// Reads and parses a `/proc/self/cgroup` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_self_cgroup(path: &Path) -> Result<Vec<CgroupMembership>> {
    tracing::debug!(path = %path.display(), "reading cgroup membership");
    read_trimmed(path).map(|content| parse_self_cgroup(&content))
}

/// Reads and parses a `/proc/cgroups` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_proc_cgroups(path: &Path) -> Result<Vec<ControllerStatus>> {
    tracing::debug!(path = %path.display(), "reading controller table");
    read_trimmed(path).map(|content| parse_proc_cgroups(&content))
}
