//! Codebase bundling: the listed source files become one Markdown document,
//! a `# File: <path>` heading per file followed by its contents in a fenced block.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::assemble::AssembleError;

/// File name of the bundle written into the scratch directory.
pub const BUNDLE_FILE_NAME: &str = "codebase-bundle.md";

/// A fence one backtick longer than the longest backtick run in `content` (minimum three).
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn language_tag(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Renders the files under `dir` in the given order into one Markdown string.
pub fn render_bundle(dir: &Path, files: &[String]) -> Result<String, AssembleError> {
    let mut out = String::new();
    for file in files {
        let full_path = dir.join(file);
        let content = match fs::read_to_string(&full_path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!(file = %file, path = %full_path.display(), "Listed source file does not exist");
                return Err(AssembleError::MissingInput { file: file.clone() });
            }
            Err(source) => {
                error!(path = %full_path.display(), error = ?source, "Failed to read source file");
                return Err(AssembleError::Io {
                    path: full_path,
                    source,
                });
            }
        };
        debug!(file = %file, bytes = content.len(), "Adding source file to bundle");

        let fence = fence_for(&content);
        out.push_str(&format!("# File: {file}\n\n"));
        out.push_str(&format!("{fence}{}\n", language_tag(file)));
        out.push_str(&content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("{fence}\n\n"));
    }
    Ok(out)
}

/// Writes the bundle into `scratch_dir` and returns its path.
pub fn write_bundle(dir: &Path, files: &[String], scratch_dir: &Path) -> Result<PathBuf, AssembleError> {
    let bundle = render_bundle(dir, files)?;
    let path = scratch_dir.join(BUNDLE_FILE_NAME);
    fs::write(&path, bundle).map_err(|source| AssembleError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), files = files.len(), "Wrote codebase bundle");
    Ok(path)
}
