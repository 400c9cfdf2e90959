//! Run configuration for one pipeline invocation.
//!
//! Every value the pipeline needs is carried here and passed in explicitly;
//! nothing is read from process-wide state once the run has started.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

/// Placeholder replaced by the user's home directory in every record value.
pub const HOME_PLACEHOLDER: &str = "{home_directory}";

/// Secret note field holding the codebase record.
pub const CODEBASE_FIELD_LABEL: &str = "codebase_directories_and_files";

/// An external command: the program plus the arguments that always lead its argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTool {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExternalTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a command with the leading arguments applied; callers append the rest.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Which kind of document the pipeline assembles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Pages listed in the wiki sidebar, handed to the converter as they are.
    Wiki,
    /// Source files listed in a codebase manifest, bundled into fenced blocks first.
    Codebase,
}

/// Names of the configuration record entries the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKeys {
    /// Local checkout directory.
    pub directory: String,
    /// Output file name.
    pub output: String,
    /// Directory the output is written into, if any.
    #[serde(default)]
    pub upload: Option<String>,
}

/// Ordering manifest inside the checkout and the extension appended to each target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestConfig {
    pub file_name: String,
    #[serde(default)]
    pub extension: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPolicy {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Stop the run when `git pull` fails instead of rendering the stale checkout.
    #[serde(default)]
    pub abort_on_failure: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            abort_on_failure: false,
        }
    }
}

/// Converter invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    pub tool: ExternalTool,
    pub toc_depth: u8,
    /// Flags placed after the table-of-contents flags and before the input files.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            tool: ExternalTool::new("pandoc"),
            toc_depth: 2,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub kind: DocumentKind,
    /// Label of the secret note field holding the record. Falls back to the identity name.
    pub field_label: Option<String>,
    pub keys: RecordKeys,
    pub manifest: ManifestConfig,
    pub refresh: RefreshPolicy,
    pub converter: ConverterConfig,
    /// Record values are relative after substitution; they are joined onto this root.
    pub filesystem_root: PathBuf,
}

impl PipelineConfig {
    /// Defaults for a GitHub wiki checkout ordered by `_Sidebar.md`.
    pub fn wiki() -> Self {
        Self {
            kind: DocumentKind::Wiki,
            field_label: None,
            keys: RecordKeys {
                directory: "local_wiki_directory".into(),
                output: "output_pdf".into(),
                upload: Some("upload_directory".into()),
            },
            manifest: ManifestConfig {
                file_name: "_Sidebar.md".into(),
                extension: ".md".into(),
            },
            refresh: RefreshPolicy::default(),
            converter: ConverterConfig::default(),
            filesystem_root: PathBuf::from("/"),
        }
    }

    /// Defaults for a codebase checkout ordered by `codeBase-list.md`.
    pub fn codebase() -> Self {
        Self {
            kind: DocumentKind::Codebase,
            field_label: Some(CODEBASE_FIELD_LABEL.into()),
            keys: RecordKeys {
                directory: "local_codebase_directory".into(),
                output: "output_pdf".into(),
                upload: None,
            },
            manifest: ManifestConfig {
                file_name: "codeBase-list.md".into(),
                extension: String::new(),
            },
            refresh: RefreshPolicy::default(),
            converter: ConverterConfig::default(),
            filesystem_root: PathBuf::from("/"),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            kind = ?self.kind,
            manifest = %self.manifest.file_name,
            refresh = self.refresh.enabled,
            converter = %self.converter.tool.program,
            "Loaded pipeline config"
        );
        debug!(?self, "Pipeline config loaded (full debug)");
    }
}
