use crate::domain::model::RepositoryReference;
use crate::domain::ports::RepositoryCloner;
use crate::utils::error::{HarnessError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Shallow clone through the `git` executable.
pub struct GitCloner {
    program: String,
}

impl Default for GitCloner {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCloner {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

#[async_trait]
impl RepositoryCloner for GitCloner {
    async fn clone_into(&self, reference: &RepositoryReference, destination: &Path) -> Result<()> {
        let command = format!("{} clone {}", self.program, reference);
        tracing::debug!("Running {} into {}", command, destination.display());

        // The child is killed if the clone future is dropped, so the workspace can go.
        let output = Command::new(&self.program)
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--quiet")
            .arg(reference.url())
            .arg(destination)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HarnessError::ProcessError {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::ProcessError {
                command,
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}
