//! Directory-structure provider: turns a password-manager secure note into a
//! [`ConfigRecord`] of local paths.
//!
//! The note is fetched through a [`SecretStore`] (normally the password manager's
//! CLI, see [`CliSecretStore`]) and is expected to look like:
//!
//! ```json
//! { "fields": [ { "label": "alice", "value": "{\"local_wiki_directory\": \"{home_directory}/wiki\"}" } ] }
//! ```
//!
//! The field is selected by label. Its value is a JSON object of string to string
//! (either inline or encoded as a string), and every value has
//! `{home_directory}` substituted and its leading `/` stripped.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{ExternalTool, HOME_PLACEHOLDER};
use crate::contract::SecretStore;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to launch secret CLI `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("secret CLI exited with {status}: {stderr}")]
    NonZeroExit { status: ExitStatus, stderr: String },
    #[error("secret note is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("secret note has an unexpected shape: {0}")]
    UnexpectedShape(String),
    #[error("cannot derive an identity from home directory {home}")]
    UnknownIdentity { home: PathBuf },
    #[error("`{label}` is not a known identity: the secret note has no field with that label")]
    FieldNotFound { label: String },
    #[error("configuration record has no entry `{key}`")]
    KeyNotFound { key: String },
}

/// Who is running the tool, derived from the home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    home_dir: PathBuf,
}

impl Identity {
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
        }
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// Account name: the last component of the home directory.
    pub fn name(&self) -> Option<&str> {
        self.home_dir.file_name().and_then(|n| n.to_str())
    }

    /// The label to look up, preferring an explicit override.
    pub fn field_label(&self, explicit: Option<&str>) -> Result<String, DirectoryError> {
        match explicit {
            Some(label) => Ok(label.to_string()),
            None => self
                .name()
                .map(str::to_string)
                .ok_or_else(|| DirectoryError::UnknownIdentity {
                    home: self.home_dir.clone(),
                }),
        }
    }
}

/// Immutable mapping of configuration names to resolved path strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRecord {
    entries: BTreeMap<String, String>,
}

impl ConfigRecord {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Result<&str, DirectoryError> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DirectoryError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Resolves an entry against `root`. Substituted values carry no leading slash,
    /// so they land under the root rather than replacing it.
    pub fn path(&self, key: &str, root: &Path) -> Result<PathBuf, DirectoryError> {
        self.get(key).map(|value| root.join(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Substitutes the home directory into `raw` and strips the leading slash.
pub fn resolve_placeholder(raw: &str, home_dir: &Path) -> String {
    let home = home_dir.to_string_lossy();
    raw.replace(HOME_PLACEHOLDER, &home)
        .trim_start_matches('/')
        .to_string()
}

#[derive(Deserialize)]
struct SecretNote {
    fields: Vec<NoteField>,
}

#[derive(Deserialize)]
struct NoteField {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    value: serde_json::Value,
}

/// Parses the raw note JSON and extracts the record stored under `label`.
pub fn parse_directory_structure(
    raw: &str,
    label: &str,
    home_dir: &Path,
) -> Result<ConfigRecord, DirectoryError> {
    let note: SecretNote = serde_json::from_str(raw)?;

    let field = note
        .fields
        .into_iter()
        .find(|f| f.label.as_deref() == Some(label))
        .ok_or_else(|| DirectoryError::FieldNotFound {
            label: label.to_string(),
        })?;

    let mapping: BTreeMap<String, String> = match field.value {
        serde_json::Value::String(encoded) => serde_json::from_str(&encoded)?,
        value @ serde_json::Value::Object(_) => serde_json::from_value(value)?,
        other => {
            return Err(DirectoryError::UnexpectedShape(format!(
                "field `{label}` must hold a JSON object, found {other}"
            )))
        }
    };

    Ok(ConfigRecord {
        entries: mapping
            .into_iter()
            .map(|(k, v)| {
                let resolved = resolve_placeholder(&v, home_dir);
                (k, resolved)
            })
            .collect(),
    })
}

/// Fetches the note from `store` and parses the record stored under `label`.
pub async fn load_record<S>(
    store: &S,
    label: &str,
    home_dir: &Path,
) -> Result<ConfigRecord, DirectoryError>
where
    S: SecretStore + ?Sized,
{
    info!(label = %label, "Fetching directory structure from secret store");
    let raw = store.fetch_note().await.map_err(|e| {
        error!(error = %e, "Secret store fetch failed");
        e
    })?;

    match parse_directory_structure(&raw, label, home_dir) {
        Ok(record) => {
            info!(label = %label, entries = record.len(), "Directory structure resolved");
            debug!(keys = ?record.keys().collect::<Vec<_>>(), "Configuration record keys");
            Ok(record)
        }
        Err(e) => {
            error!(label = %label, error = %e, "Failed to resolve directory structure");
            Err(e)
        }
    }
}

/// Secret store backed by a password-manager CLI writing the note as JSON on stdout,
/// e.g. `op item get Chronos --format json`.
pub struct CliSecretStore {
    tool: ExternalTool,
}

impl CliSecretStore {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl SecretStore for CliSecretStore {
    async fn fetch_note(&self) -> Result<String, DirectoryError> {
        debug!(program = %self.tool.program, args = ?self.tool.args, "Running secret CLI");
        let output = self
            .tool
            .command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| DirectoryError::Launch {
                program: self.tool.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DirectoryError::NonZeroExit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
