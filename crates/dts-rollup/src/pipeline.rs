//! Pipeline orchestration.

use crate::assembly::{self, AssemblyError};
use crate::config::{ConfigError, RollupConfig};
use camino::{Utf8Path, Utf8PathBuf};
use dts_resolver::{resolve_entry, ResolveError};
use dts_transformer::{prune, TransformError};
use std::fs;
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Runs the whole rollup: resolve, prune, assemble, write.
///
/// The output file is written once, at the end; a failure in any stage
/// leaves the filesystem untouched.
pub fn run(config_path: &Utf8Path) -> Result<Utf8PathBuf, PipelineError> {
    let config = RollupConfig::load(config_path)?;
    let config_dir = config_path
        .parent()
        .unwrap_or(Utf8Path::new("."))
        .to_owned();

    let entry = config.entry(&config_dir);
    info!(entry = %entry, "resolving declaration tree");
    let master = resolve_entry(&entry, &config.resolve_options(&config_dir))?;
    debug!(declarations = master.len(), "resolution complete");

    let pruned = prune(&master.concatenated(), &config.transform_options())?;

    let banner = match &config.package {
        Some(package) => assembly::version_banner(&config_dir.join(package))?,
        None => None,
    };
    let includes: Vec<Utf8PathBuf> = config
        .include
        .iter()
        .map(|path| config_dir.join(path))
        .collect();
    let output_text = assembly::assemble(&includes, banner.as_deref(), &pruned)?;

    let output = config_dir.join(&config.output);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Write {
            path: output.clone(),
            source,
        })?;
    }
    fs::write(&output, output_text).map_err(|source| PipelineError::Write {
        path: output.clone(),
        source,
    })?;
    info!(output = %output, "rollup written");
    Ok(output)
}
