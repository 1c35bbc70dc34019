//! # oscontainer-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the oscontainer workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and holds the plain data that the detection engine in
//! `oscontainer-core` produces and the CLI prints.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
