//! `composure init` — Print a default composition for the current project.

use clap::Args;
use composure_common::config::ComposureConfig;

use crate::output;

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Image the service runs.
    #[arg(long, conflicts_with = "dockerfile")]
    pub image: Option<String>,

    /// Dockerfile the service is built from, relative to the project.
    #[arg(long)]
    pub dockerfile: Option<String>,
}

/// Executes the `init` command.
///
/// # Errors
///
/// Returns an error if the default composition cannot be rendered.
pub fn execute(args: &InitArgs, config: &ComposureConfig) -> anyhow::Result<()> {
    let text = composure_compose::default_composition(
        args.image.as_deref(),
        args.dockerfile.as_deref(),
        config,
    )?;
    output::emit(&text);
    Ok(())
}
