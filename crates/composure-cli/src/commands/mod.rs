//! CLI command definitions and dispatch.

pub mod images;
pub mod init;
pub mod normalize;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use composure_common::config::ComposureConfig;
use composure_common::constants::{BIN_NAME, DEFAULT_MAX_CONCURRENT_FETCHES};
use composure_compose::{Composition, Normalizer};
use serde_json::Value;

/// Composure — normalize container composition documents.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Project directory env files are resolved against.
    ///
    /// Defaults to the directory of the composition file.
    #[arg(long, global = true, env = "COMPOSURE_PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// Maximum number of env files read at the same time.
    #[arg(
        long,
        global = true,
        env = "COMPOSURE_MAX_CONCURRENT_FETCHES",
        default_value_t = DEFAULT_MAX_CONCURRENT_FETCHES
    )]
    pub max_concurrent_fetches: usize,

    /// Skip structural schema validation.
    #[arg(long, global = true)]
    pub no_schema: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the canonical form of a composition.
    Normalize(normalize::NormalizeArgs),
    /// Print the build-or-pull descriptor of every service.
    Images(images::ImagesArgs),
    /// Print the service startup order.
    Plan(plan::PlanArgs),
    /// Print a default composition for the current project.
    Init(init::InitArgs),
}

impl Cli {
    /// Builds the configuration for a run on `file`.
    pub fn config(&self, file: Option<&Path>) -> ComposureConfig {
        let project_dir = self.project_dir.clone().unwrap_or_else(|| {
            file.and_then(Path::parent)
                .filter(|dir| !dir.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        });
        ComposureConfig {
            tool_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            project_dir,
            max_concurrent_fetches: self.max_concurrent_fetches,
            validate_schema: !self.no_schema,
            ..ComposureConfig::default()
        }
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Normalize(args) => {
            let config = cli.config(Some(args.file.as_path()));
            normalize::execute(args, &config).await
        }
        Command::Images(args) => images::execute(args, &cli.config(Some(args.file.as_path()))),
        Command::Plan(args) => plan::execute(args, &cli.config(Some(args.file.as_path()))),
        Command::Init(args) => init::execute(args, &cli.config(None)),
    }
}

/// Reads a YAML or JSON composition file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not YAML.
pub fn load_document(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Reads and normalizes a composition file.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or normalization fails.
pub fn load_composition(path: &Path, config: &ComposureConfig) -> anyhow::Result<Composition> {
    let document = load_document(path)?;
    tracing::info!(path = %path.display(), "loaded composition");
    let composition = Normalizer::from_config(config)?.normalize(&document)?;
    Ok(composition)
}
