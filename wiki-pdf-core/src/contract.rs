#![allow(unused)]

//! # contract: seams to the external tools the pipeline shells out to
//!
//! Each external collaborator sits behind one small async trait so the
//! pipeline can run against the real CLIs or against `mockall` mocks:
//!
//! - [`SecretStore`]: fetches the secure note describing local paths.
//! - [`Refresher`]: brings a local checkout up to date.
//! - [`Converter`]: renders an ordered list of Markdown files into one document.
//!
//! Mocks are generated under `cfg(test)` and the `test-export-mocks` feature so
//! integration tests in `tests/` can use them too.

use async_trait::async_trait;
use mockall::automock;
use std::path::{Path, PathBuf};

use crate::assemble::AssembleError;
use crate::directory::DirectoryError;
use crate::refresh::RefreshError;

/// One converter run: inputs are relative to `working_dir`, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub working_dir: PathBuf,
    pub output: PathBuf,
    pub inputs: Vec<String>,
    pub toc_depth: u8,
}

/// Source of the raw secure note JSON.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch_note(&self) -> Result<String, DirectoryError>;
}

/// Updates a local checkout in place (`git pull`).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Refresher: Send + Sync {
    async fn refresh(&self, working_dir: &Path) -> Result<(), RefreshError>;
}

/// Renders the requested inputs into `request.output`. Does not render markup itself.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, request: &ConversionRequest) -> Result<(), AssembleError>;
}
