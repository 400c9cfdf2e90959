//! `load_config` module: loads the YAML run configuration and adapts it into the
//! core crate's [`PipelineConfig`].
//!
//! The file names the external tools (secret CLI, git, pandoc) and, optionally,
//! overrides the wiki/codebase presets. It never holds paths to the checkout:
//! those come from the secret note at run time.
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use wiki_pdf_core::config::{
    ConverterConfig, DocumentKind, ExternalTool, PipelineConfig, RecordKeys, RefreshPolicy,
};

#[derive(Debug, Deserialize)]
pub struct SecretSection {
    #[serde(flatten)]
    pub tool: ExternalTool,
    /// Label of the note field; defaults to the account name.
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PandocSection {
    #[serde(default = "default_pandoc")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default = "default_toc_depth")]
    pub toc_depth: u8,
}

impl Default for PandocSection {
    fn default() -> Self {
        Self {
            program: default_pandoc(),
            args: Vec::new(),
            extra_args: Vec::new(),
            toc_depth: default_toc_depth(),
        }
    }
}

/// Per-document overrides of the built-in presets.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentSection {
    /// Label of the note field for this document; beats `secret.field`.
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub keys: Option<RecordKeys>,
}

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub secret: SecretSection,
    #[serde(default = "default_git")]
    pub git: ExternalTool,
    #[serde(default)]
    pub pandoc: PandocSection,
    #[serde(default = "default_root")]
    pub filesystem_root: PathBuf,
    #[serde(default)]
    pub refresh: RefreshPolicy,
    #[serde(default)]
    pub wiki: DocumentSection,
    #[serde(default)]
    pub codebase: DocumentSection,
}

fn default_pandoc() -> String {
    "pandoc".to_string()
}

fn default_toc_depth() -> u8 {
    2
}

fn default_git() -> ExternalTool {
    ExternalTool::new("git")
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

/// Command-line switches that override the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub field_label: Option<String>,
    pub no_pull: bool,
}

impl CliConfig {
    pub fn converter(&self) -> ConverterConfig {
        ConverterConfig {
            tool: ExternalTool::new(self.pandoc.program.clone()).with_args(self.pandoc.args.clone()),
            toc_depth: self.pandoc.toc_depth,
            extra_args: self.pandoc.extra_args.clone(),
        }
    }

    /// Preset for `kind`, overlaid with this file and the command-line overrides.
    pub fn pipeline_config(&self, kind: DocumentKind, overrides: &Overrides) -> PipelineConfig {
        let (mut config, section) = match kind {
            DocumentKind::Wiki => (PipelineConfig::wiki(), &self.wiki),
            DocumentKind::Codebase => (PipelineConfig::codebase(), &self.codebase),
        };

        if let Some(manifest) = &section.manifest {
            config.manifest.file_name = manifest.clone();
        }
        if let Some(extension) = &section.extension {
            config.manifest.extension = extension.clone();
        }
        if let Some(keys) = &section.keys {
            config.keys = keys.clone();
        }

        // --profile, then the section, then the preset's own label, then `secret.field`.
        // Nothing set leaves the account name to the pipeline.
        config.field_label = overrides
            .field_label
            .clone()
            .or_else(|| section.field.clone())
            .or(config.field_label.take())
            .or_else(|| self.secret.field.clone());
        config.refresh = self.refresh;
        if overrides.no_pull {
            config.refresh.enabled = false;
        }
        config.converter = self.converter();
        config.filesystem_root = self.filesystem_root.clone();
        config
    }
}

/// Loads the YAML config file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<CliConfig>(&config_content) {
        Ok(conf) => {
            info!(
                config_path = ?path_ref,
                secret_cli = %conf.secret.tool.program,
                "Parsed config YAML successfully"
            );
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
