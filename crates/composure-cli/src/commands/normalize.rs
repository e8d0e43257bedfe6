//! `composure normalize` — Print the canonical form of a composition.

use std::path::PathBuf;

use clap::Args;
use composure_common::config::ComposureConfig;
use composure_compose::{KeyValues, Normalizer, ProjectFileResolver};

use crate::output::{self, OutputFormat};

/// Arguments for the `normalize` command.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Path to the composition file (YAML or JSON).
    #[arg(default_value = "docker-compose.yml")]
    pub file: PathBuf,

    /// Merge env files and interpolate variables from the process environment.
    #[arg(long)]
    pub expand_env: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

/// Executes the `normalize` command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded, normalized or expanded.
pub async fn execute(args: &NormalizeArgs, config: &ComposureConfig) -> anyhow::Result<()> {
    let composition = if args.expand_env {
        let document = super::load_document(&args.file)?;
        let resolver = ProjectFileResolver::new(&config.project_dir)?;
        let variables: KeyValues = std::env::vars().collect();
        tracing::info!(
            project_dir = %resolver.root().display(),
            "normalizing with env file expansion"
        );
        Normalizer::from_config(config)?
            .normalize_with_env_files(&document, &resolver, &variables)
            .await?
    } else {
        super::load_composition(&args.file, config)?
    };

    output::emit(&output::render(&composition, args.format)?);
    Ok(())
}
