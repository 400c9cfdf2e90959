use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;

use crate::config::ExternalTool;
use crate::contract::Refresher;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to launch `{program}` in {dir}: {source}")]
    Launch {
        program: String,
        dir: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`git pull` in {dir} exited with {status}: {stderr}")]
    NonZeroExit {
        dir: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Runs `git pull` with the checkout as the child's working directory.
pub struct GitRefresher {
    tool: ExternalTool,
}

impl GitRefresher {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }
}

impl Default for GitRefresher {
    fn default() -> Self {
        Self::new(ExternalTool::new("git"))
    }
}

#[async_trait]
impl Refresher for GitRefresher {
    async fn refresh(&self, working_dir: &Path) -> Result<(), RefreshError> {
        let dir = working_dir.display().to_string();
        let output = self
            .tool
            .command()
            .arg("pull")
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                tracing::info!(
                    path = %dir,
                    status = ?out.status,
                    "Pulled latest changes"
                );
                Ok(())
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                tracing::error!(
                    path = %dir,
                    stderr = %stderr,
                    "Git pull exited with non-zero code: {}", out.status
                );
                Err(RefreshError::NonZeroExit {
                    dir,
                    status: out.status,
                    stderr,
                })
            }
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    path = %dir,
                    "Failed to launch git process"
                );
                Err(RefreshError::Launch {
                    program: self.tool.program.clone(),
                    dir,
                    source: e,
                })
            }
        }
    }
}
