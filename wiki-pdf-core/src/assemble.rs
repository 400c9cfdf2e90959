//! Document assembler: hands an ordered file list to the converter (pandoc)
//! and turns its exit status and stderr into a typed result.
//!
//! The converter is run as
//! `<program> <leading args> -o <output> --toc --toc-depth=<n> <extra args> <inputs...>`
//! with the checkout as its working directory. A converter complaint about a
//! missing input is surfaced as [`AssembleError::MissingInput`] naming the file;
//! every other failure is [`AssembleError::ConversionFailed`]. Nothing is retried.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{ConverterConfig, ExternalTool};
use crate::contract::{ConversionRequest, Converter};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("missing input file: {file}")]
    MissingInput { file: String },
    #[error("no input files to assemble")]
    NoInputs,
    #[error("converter exited with {status}: {stderr}")]
    ConversionFailed { status: ExitStatus, stderr: String },
    #[error("failed to launch converter `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssembleError {
    pub fn is_missing_input(&self) -> bool {
        matches!(self, AssembleError::MissingInput { .. })
    }
}

fn missing_input_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^(?:pandoc:\s*)?(.+?):\s*(?:openBinaryFile|withBinaryFile|openFile|withFile):\s*does not exist",
        )
        .expect("missing input pattern is valid")
    })
}

/// Name of the input the converter could not find, if its stderr says so.
pub fn missing_input_from_stderr(stderr: &str) -> Option<String> {
    missing_input_pattern()
        .captures(stderr)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Where the output lands: inside the upload target when one is configured.
pub fn output_path(output: &Path, upload_target: Option<&Path>) -> PathBuf {
    match upload_target {
        Some(target) => target.join(output),
        None => output.to_path_buf(),
    }
}

/// Everything one assembly needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct AssemblyPlan<'a> {
    pub files: &'a [String],
    pub working_dir: &'a Path,
    pub output: &'a Path,
    pub upload_target: Option<&'a Path>,
    pub toc_depth: u8,
}

/// Runs the converter for `plan` and returns the path of the written document.
pub async fn assemble_document<C>(converter: &C, plan: AssemblyPlan<'_>) -> Result<PathBuf, AssembleError>
where
    C: Converter + ?Sized,
{
    if plan.files.is_empty() {
        error!(dir = %plan.working_dir.display(), "Nothing to assemble: page list is empty");
        return Err(AssembleError::NoInputs);
    }

    // Relative outputs are relative to the checkout, as the converter would see them.
    let output = plan
        .working_dir
        .join(output_path(plan.output, plan.upload_target));
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| AssembleError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let request = ConversionRequest {
        working_dir: plan.working_dir.to_path_buf(),
        output: output.clone(),
        inputs: plan.files.to_vec(),
        toc_depth: plan.toc_depth,
    };

    info!(
        output = %output.display(),
        inputs = request.inputs.len(),
        "Assembling document"
    );
    match converter.convert(&request).await {
        Ok(()) => {
            info!(output = %output.display(), "Document written");
            Ok(output)
        }
        Err(e) => {
            if let AssembleError::MissingInput { file } = &e {
                error!(file = %file, "Converter reported a missing input file");
            } else {
                error!(error = %e, "Conversion failed");
            }
            Err(e)
        }
    }
}

/// Converter backed by the pandoc CLI.
pub struct PandocConverter {
    tool: ExternalTool,
    extra_args: Vec<String>,
}

impl PandocConverter {
    pub fn new(tool: ExternalTool, extra_args: Vec<String>) -> Self {
        Self { tool, extra_args }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.tool.clone(), config.extra_args.clone())
    }
}

#[async_trait]
impl Converter for PandocConverter {
    async fn convert(&self, request: &ConversionRequest) -> Result<(), AssembleError> {
        let mut cmd = self.tool.command();
        cmd.arg("-o")
            .arg(&request.output)
            .arg("--toc")
            .arg(format!("--toc-depth={}", request.toc_depth))
            .args(&self.extra_args)
            .args(&request.inputs)
            .current_dir(&request.working_dir)
            .stdin(Stdio::null());
        debug!(command = ?cmd.as_std(), "Running converter");

        let out = cmd.output().await.map_err(|source| AssembleError::Launch {
            program: self.tool.program.clone(),
            source,
        })?;

        if out.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        match missing_input_from_stderr(&stderr) {
            Some(file) => Err(AssembleError::MissingInput { file }),
            None => Err(AssembleError::ConversionFailed {
                status: out.status,
                stderr,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_extracted_from_pandoc_messages() {
        let cases = [
            (
                "pandoc: Ghost.md: openBinaryFile: does not exist (No such file or directory)",
                Some("Ghost.md"),
            ),
            (
                "pandoc: Setup-Guide.md: withBinaryFile: does not exist (No such file or directory)",
                Some("Setup-Guide.md"),
            ),
            (
                "[WARNING] something\nGhost.md: withBinaryFile: does not exist (No such file or directory)",
                Some("Ghost.md"),
            ),
            ("Error producing PDF.\n! LaTeX Error: File `x.sty' not found.", None),
            ("", None),
        ];
        for (stderr, expected) in cases {
            assert_eq!(
                missing_input_from_stderr(stderr).as_deref(),
                expected,
                "stderr: {stderr:?}"
            );
        }
    }

    #[test]
    fn output_goes_into_upload_target() {
        assert_eq!(
            output_path(Path::new("Wiki.pdf"), Some(Path::new("/drive/My Drive"))),
            PathBuf::from("/drive/My Drive/Wiki.pdf")
        );
        assert_eq!(
            output_path(Path::new("/tmp/Wiki.pdf"), None),
            PathBuf::from("/tmp/Wiki.pdf")
        );
    }
}
