//! `oscontainer nproc` — Print the active processor count.

use clap::Args;
use oscontainer_core::OsContainer;

/// Arguments for the `nproc` command.
#[derive(Args, Debug)]
pub struct NprocArgs {
    /// Print the host's logical processor count, ignoring every limit.
    #[arg(long)]
    pub all: bool,
}

/// Executes the `nproc` command.
///
/// # Errors
///
/// Never fails; the signature matches the other commands.
pub fn execute(args: &NprocArgs, container: &OsContainer) -> anyhow::Result<()> {
    let snapshot = container.snapshot();
    let count = if args.all {
        snapshot.host.logical_cpu_count
    } else {
        snapshot.active_processor_count
    };
    println!("{count}");
    Ok(())
}
