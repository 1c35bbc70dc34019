//! Kernel CPU range lists (`cpuset.cpus`, `/sys/devices/system/cpu/online`).
//!
//! A list is comma-separated tokens, each a CPU index `N` or an inclusive
//! range `A-B`. Parsing is lenient: a token that is not a valid index or
//! range is skipped and the rest of the list still counts. Indices at or
//! above [`MAX_CPUS`] are invalid.

use std::collections::BTreeSet;

use nom::{
    IResult, Parser,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    sequence::separated_pair,
};

use oscontainer_common::constants::MAX_CPUS;

/// Parses a single CPU index.
fn cpu_index(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>).parse(input)
}

/// Parses `A-B` into an inclusive pair.
fn cpu_range(input: &str) -> IResult<&str, (usize, usize)> {
    separated_pair(cpu_index, char('-'), cpu_index).parse(input)
}

/// Parses one whole token into its inclusive bounds.
fn token(input: &str) -> Option<(usize, usize)> {
    let bounds = match all_consuming(cpu_range).parse(input) {
        Ok((_, (start, end))) => (start <= end).then_some((start, end)),
        Err(_) => all_consuming(cpu_index)
            .parse(input)
            .ok()
            .map(|(_, cpu)| (cpu, cpu)),
    };
    bounds.filter(|&(_, end)| end < MAX_CPUS)
}

/// Parses a range list into the set of CPU indices it names.
///
/// Malformed tokens (`x`, `5-3`, `-1`, `0-4294967295`) are skipped.
/// Surrounding whitespace around the list and around each token is ignored.
#[must_use]
pub fn parse(text: &str) -> BTreeSet<usize> {
    let mut cpus = BTreeSet::new();
    for raw in text.trim().split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match token(raw) {
            Some((start, end)) => cpus.extend(start..=end),
            None => tracing::trace!(token = raw, "skipping malformed cpu list token"),
        }
    }
    cpus
}

/// Formats a set of CPU indices as a range list.
///
/// Contiguous runs of two or more collapse into `A-B`, so
/// `parse(&format(s)) == s` for every set of indices below [`MAX_CPUS`].
#[must_use]
pub fn format(cpus: &BTreeSet<usize>) -> String {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &cpu in cpus {
        match runs.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(cpu) => *end = cpu,
            _ => runs.push((cpu, cpu)),
        }
    }
    runs.iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
