//! `composure images` — Print the build-or-pull descriptor of every service.

use std::path::PathBuf;

use clap::Args;
use composure_common::config::ComposureConfig;

use crate::output::{self, OutputFormat};

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Path to the composition file (YAML or JSON).
    #[arg(default_value = "docker-compose.yml")]
    pub file: PathBuf,
}

/// Executes the `images` command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or normalized.
pub fn execute(args: &ImagesArgs, config: &ComposureConfig) -> anyhow::Result<()> {
    let composition = super::load_composition(&args.file, config)?;
    let descriptors = composure_compose::parse(&composition)?;
    tracing::info!(images = descriptors.len(), "resolved image descriptors");
    output::emit(&output::render(&descriptors, OutputFormat::Json)?);
    Ok(())
}
