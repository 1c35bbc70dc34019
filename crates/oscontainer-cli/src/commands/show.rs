//! `oscontainer show` — Print the detected limits.

use clap::Args;
use oscontainer_core::OsContainer;

use crate::output;

/// Arguments for the `show` command.
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Emit the full snapshot as JSON instead of the text dump.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `show` command.
///
/// Prints the fixed-shape diagnostic dump, then the host's processor count
/// and the process's scheduler affinity.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &ShowArgs, container: &OsContainer) -> anyhow::Result<()> {
    let snapshot = container.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        return Ok(());
    }

    print!("{snapshot}");
    println!();
    println!("host cpus: {}", snapshot.host.logical_cpu_count);
    println!("affinity: {}", output::format_affinity(snapshot.host.affinity_mask.as_ref()));
    println!("cgroup path: {}", snapshot.context.cgroup_path);
    println!("memory limit: {}", output::format_limit(snapshot.memory.limit_bytes));
    println!("memory usage: {}", output::format_bytes(snapshot.memory.usage_bytes));
    println!("cpu shares (equivalent): {}", snapshot.cpu_shares_equivalent());
    Ok(())
}
