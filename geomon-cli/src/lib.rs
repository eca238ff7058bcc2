//! Command-line interface for reconciling feature snapshots.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

use geomon_core::{DEFAULT_ID_ATTRIBUTE, FeatureCache, ReconcileError, ReconcileSummary};
use geomon_data::{GeoJsonError, load_features};

const ARG_BASELINE: &str = "baseline";
const ARG_UPDATE: &str = "update";
const ENV_BASELINE: &str = "GEOMON_CMDS_DIFF_BASELINE";

/// Run the geomon CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Diff(args) => {
            let config = args.into_config()?;
            config.validate_sources()?;
            let report = run_diff(&config)?;
            println!("{report}");
        }
    }
    Ok(())
}

/// Reconcile the configured snapshots through one cache and render one
/// report line per snapshot.
fn run_diff(config: &DiffConfig) -> Result<String, CliError> {
    let mut cache = FeatureCache::with_id_attribute(config.id_attribute.clone());
    let mut lines = Vec::with_capacity(config.updates.len() + 1);

    let baseline = load_features(&config.baseline)?;
    let summary = cache.reconcile(baseline)?;
    lines.push(report_line(&config.baseline, &summary));

    for update in &config.updates {
        let batch = load_features(update)?;
        let update_summary = cache.reconcile(batch)?;
        lines.push(report_line(update, &update_summary));
    }
    Ok(lines.join("\n"))
}

fn report_line(path: &Path, summary: &ReconcileSummary) -> String {
    format!(
        "{}: {} added, {} updated, {} unchanged ({} with geometry, {} cached)",
        path.display(),
        summary.added(),
        summary.updated(),
        summary.unchanged(),
        summary.non_empty_geometries,
        summary.cache_size,
    )
}

#[derive(Debug, Parser)]
#[command(
    name = "geomon",
    about = "Snapshot reconciliation utilities for the geomon engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile GeoJSON snapshots against a fresh feature cache.
    Diff(DiffArgs),
}

/// CLI arguments for the `diff` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Reconcile a baseline snapshot and any number of updates \
                 through one feature cache. Paths can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Reconcile GeoJSON snapshots against a feature cache"
)]
#[ortho_config(prefix = "GEOMON")]
struct DiffArgs {
    /// Path to the baseline GeoJSON snapshot.
    #[arg(long = ARG_BASELINE, value_name = "path")]
    #[serde(default)]
    baseline: Option<PathBuf>,
    /// Update snapshots, reconciled in the given order.
    #[arg(long = ARG_UPDATE, value_name = "path")]
    #[serde(default)]
    update: Vec<PathBuf>,
    /// Attribute consulted for feature identity.
    #[arg(long = "id-attribute", value_name = "name")]
    #[serde(default)]
    id_attribute: Option<String>,
}

impl DiffArgs {
    fn into_config(self) -> Result<DiffConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DiffConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DiffConfig {
    baseline: PathBuf,
    updates: Vec<PathBuf>,
    id_attribute: String,
}

impl DiffConfig {
    fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.baseline, ARG_BASELINE)?;
        for update in &self.updates {
            Self::require_existing(update, ARG_UPDATE)?;
        }
        Ok(())
    }

    fn require_existing(path: &Path, field: &'static str) -> Result<(), CliError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
    }
}

impl TryFrom<DiffArgs> for DiffConfig {
    type Error = CliError;

    fn try_from(args: DiffArgs) -> Result<Self, Self::Error> {
        let baseline = args.baseline.ok_or(CliError::MissingArgument {
            field: ARG_BASELINE,
            env: ENV_BASELINE,
        })?;
        Ok(Self {
            baseline,
            updates: args.update,
            id_attribute: args
                .id_attribute
                .unwrap_or_else(|| DEFAULT_ID_ATTRIBUTE.into()),
        })
    }
}

/// Errors emitted by the geomon CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced snapshot path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile { field: &'static str, path: PathBuf },
    /// A snapshot could not be read or decoded.
    #[error("failed to load snapshot")]
    Snapshot(#[from] GeoJsonError),
    /// Reconciliation aborted part-way through a snapshot.
    #[error("reconciliation failed")]
    Reconcile(#[from] ReconcileError),
}

#[cfg(test)]
mod tests;
