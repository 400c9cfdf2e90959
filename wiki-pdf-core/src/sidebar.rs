//! Sidebar parser: reads an ordering manifest and lists the pages it links to.
//!
//! Only lines carrying a Markdown link `[text](target)` contribute; the target of
//! the first link on a line is taken, the configured extension is appended, and
//! encounter order is preserved. Duplicates are kept.

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum SidebarError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn link_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(?:[^\[\]]|\[[^\[\]]*\])*\]\(([^)]+)\)").expect("link pattern is valid"))
}

/// Target of the first Markdown link on `line`, if any.
pub fn link_target(line: &str) -> Option<&str> {
    let caps = link_pattern().captures(line)?;
    let target = caps.get(1)?.as_str().trim();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

/// Extracts the ordered targets from any line source.
pub fn extract_targets<R: BufRead>(reader: R, extension: &str) -> std::io::Result<Vec<String>> {
    let mut pages = Vec::new();
    for line in reader.lines() {
        let line = line?;
        match link_target(&line) {
            Some(target) => pages.push(format!("{target}{extension}")),
            None => debug!(line = %line, "Skipping manifest line without link"),
        }
    }
    Ok(pages)
}

/// Reads `dir/file_name` and returns the page list in manifest order.
pub fn parse_sidebar(dir: &Path, file_name: &str, extension: &str) -> Result<Vec<String>, SidebarError> {
    let path = dir.join(file_name);
    let read_err = |source| SidebarError::Read {
        path: path.clone(),
        source,
    };

    let file = File::open(&path).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to open manifest");
        read_err(e)
    })?;

    let pages = extract_targets(BufReader::new(file), extension).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to read manifest");
        read_err(e)
    })?;

    info!(path = %path.display(), pages = pages.len(), "Parsed page order from manifest");
    Ok(pages)
}
