//! High-level pipeline: fetch config → refresh local copy → parse ordering → assemble document.
//!
//! Each step is awaited before the next one starts and the first failure ends the
//! run, except a failed refresh, which by default is logged and the stale checkout
//! is rendered anyway (see [`RefreshPolicy`](crate::config::RefreshPolicy)).
//!
//! # Navigation
//! - Main entrypoint: [`run_pipeline`]
//! - Supporting types: [`PipelineReport`], [`RefreshOutcome`], [`PipelineError`].

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::assemble::{assemble_document, AssembleError, AssemblyPlan};
use crate::codebase::write_bundle;
use crate::config::{DocumentKind, PipelineConfig};
use crate::contract::{Converter, Refresher, SecretStore};
use crate::directory::{load_record, ConfigRecord, DirectoryError, Identity};
use crate::refresh::RefreshError;
use crate::sidebar::{parse_sidebar, SidebarError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error(transparent)]
    Sidebar(#[from] SidebarError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
}

impl PipelineError {
    pub fn is_missing_input(&self) -> bool {
        matches!(self, PipelineError::Assemble(e) if e.is_missing_input())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    Skipped,
    Failed(String),
}

#[derive(Debug)]
pub struct PipelineReport {
    pub field_label: String,
    pub working_dir: PathBuf,
    pub refresh: RefreshOutcome,
    pub pages: Vec<String>,
    pub output: PathBuf,
}

/// Output file and the directory it goes into, resolved from the record.
/// Without an upload target the output stays relative and lands in the checkout.
fn resolve_output(
    record: &ConfigRecord,
    config: &PipelineConfig,
) -> Result<(PathBuf, Option<PathBuf>), DirectoryError> {
    let output = PathBuf::from(record.get(&config.keys.output)?);
    let upload_target = match &config.keys.upload {
        Some(upload_key) => Some(record.path(upload_key, &config.filesystem_root)?),
        None => None,
    };
    Ok((output, upload_target))
}

async fn refresh_checkout<R>(
    refresher: &R,
    working_dir: &Path,
    config: &PipelineConfig,
) -> Result<RefreshOutcome, PipelineError>
where
    R: Refresher + ?Sized,
{
    if !config.refresh.enabled {
        info!(path = %working_dir.display(), "Refresh disabled, using checkout as is");
        return Ok(RefreshOutcome::Skipped);
    }
    match refresher.refresh(working_dir).await {
        Ok(()) => Ok(RefreshOutcome::Updated),
        Err(e) if config.refresh.abort_on_failure => {
            error!(error = %e, "Refresh failed, aborting");
            Err(e.into())
        }
        Err(e) => {
            warn!(error = %e, "Refresh failed, continuing with the local copy");
            Ok(RefreshOutcome::Failed(e.to_string()))
        }
    }
}

pub async fn run_pipeline<S, R, C>(
    config: &PipelineConfig,
    identity: &Identity,
    store: &S,
    refresher: &R,
    converter: &C,
) -> Result<PipelineReport, PipelineError>
where
    S: SecretStore + ?Sized,
    R: Refresher + ?Sized,
    C: Converter + ?Sized,
{
    info!(kind = ?config.kind, "Starting pipeline");

    // --- Step 1: Fetch config ---
    let field_label = identity.field_label(config.field_label.as_deref())?;
    let record = load_record(store, &field_label, identity.home_dir()).await?;
    let working_dir = record.path(&config.keys.directory, &config.filesystem_root)?;
    let (output, upload_target) = resolve_output(&record, config)?;

    // --- Step 2: Refresh local copy ---
    let refresh = refresh_checkout(refresher, &working_dir, config).await?;

    // --- Step 3: Parse ordering ---
    let pages = parse_sidebar(
        &working_dir,
        &config.manifest.file_name,
        &config.manifest.extension,
    )?;
    if pages.is_empty() {
        error!(manifest = %config.manifest.file_name, "Manifest lists no pages");
        return Err(AssembleError::NoInputs.into());
    }

    // --- Step 4: Assemble document ---
    let written = match config.kind {
        DocumentKind::Wiki => {
            let plan = AssemblyPlan {
                files: &pages,
                working_dir: &working_dir,
                output: &output,
                upload_target: upload_target.as_deref(),
                toc_depth: config.converter.toc_depth,
            };
            assemble_document(converter, plan).await?
        }
        DocumentKind::Codebase => {
            let scratch = tempfile::tempdir().map_err(PipelineError::Scratch)?;
            let bundle = write_bundle(&working_dir, &pages, scratch.path())?;
            let inputs = vec![bundle.to_string_lossy().into_owned()];
            let plan = AssemblyPlan {
                files: &inputs,
                working_dir: &working_dir,
                output: &output,
                upload_target: upload_target.as_deref(),
                toc_depth: config.converter.toc_depth,
            };
            assemble_document(converter, plan).await?
        }
    };

    info!(output = %written.display(), pages = pages.len(), "Pipeline complete");
    Ok(PipelineReport {
        field_label,
        working_dir,
        refresh,
        pages,
        output: written,
    })
}
