//! CLI command definitions and dispatch.

pub mod nproc;
pub mod show;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oscontainer_common::config::ProbeConfig;
use oscontainer_common::constants::ROOT_ENV;
use oscontainer_core::{OsContainer, SystemHost};

/// oscontainer — CPU and memory limits visible to this process.
#[derive(Parser, Debug)]
#[command(name = "oscontainer", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute; defaults to `show`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Filesystem root under which `/proc` and `/sys/fs/cgroup` are read.
    #[arg(long, global = true, env = ROOT_ENV)]
    pub root: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the diagnostic dump followed by host information.
    Show(show::ShowArgs),
    /// Print the number of processors available to this process.
    Nproc(nproc::NprocArgs),
}

impl Cli {
    /// Probe configuration selected by the global flags.
    #[must_use]
    pub fn probe_config(&self) -> ProbeConfig {
        self.root
            .as_ref()
            .map_or_else(ProbeConfig::default, ProbeConfig::with_root)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.probe_config();
    tracing::debug!(root = %config.root.display(), "probing resource limits");
    let container = OsContainer::with_config(config, SystemHost);

    match cli.command {
        Some(Command::Show(args)) => show::execute(&args, &container),
        Some(Command::Nproc(args)) => nproc::execute(&args, &container),
        None => show::execute(&show::ShowArgs::default(), &container),
    }
}
