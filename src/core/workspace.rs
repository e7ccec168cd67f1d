use crate::utils::error::{HarnessError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const MAX_NAME_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    Created,
    Populated,
    Verified,
    Released,
}

/// Temporary directory owned by one pipeline run.
///
/// The directory is removed exactly once: by [`Workspace::release`], or on drop if the
/// owner never got that far (early return, panic, or a cancelled future).
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    clone_subpath: PathBuf,
    state: WorkspaceState,
}

impl Workspace {
    /// Creates `<parent>/<prefix>-<millis>-<pid>[-n]`, retrying the suffix on collision.
    pub fn create(parent: &Path, prefix: &str, clone_subpath: &str) -> Result<Self> {
        fs::create_dir_all(parent)?;
        let stamp = chrono::Utc::now().timestamp_millis();
        let pid = std::process::id();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = match attempt {
                0 => format!("{}-{}-{}", prefix, stamp, pid),
                n => format!("{}-{}-{}-{}", prefix, stamp, pid, n),
            };
            let root = parent.join(name);
            match fs::create_dir(&root) {
                Ok(()) => {
                    tracing::debug!("Created workspace {}", root.display());
                    return Ok(Self {
                        root,
                        clone_subpath: PathBuf::from(clone_subpath),
                        state: WorkspaceState::Created,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(HarnessError::IoError(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!(
                "could not find a free workspace name under {} after {} attempts",
                parent.display(),
                MAX_NAME_ATTEMPTS
            ),
        )))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the clone lands inside the workspace.
    pub fn clone_dir(&self) -> PathBuf {
        self.root.join(&self.clone_subpath)
    }

    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    pub fn mark_populated(&mut self) {
        self.state = WorkspaceState::Populated;
    }

    pub fn mark_verified(&mut self) {
        self.state = WorkspaceState::Verified;
    }

    /// Removes the directory tree. Returns `false` when removal failed; that is only
    /// logged, a stray directory never fails a run.
    pub fn release(mut self) -> bool {
        self.remove()
    }

    fn remove(&mut self) -> bool {
        if self.state == WorkspaceState::Released {
            return true;
        }
        self.state = WorkspaceState::Released;
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                tracing::debug!("Released workspace {}", self.root.display());
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(
                    "Failed to clean up workspace {}: {}",
                    self.root.display(),
                    e
                );
                false
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_makes_unique_directories() {
        let parent = TempDir::new().unwrap();

        let first = Workspace::create(parent.path(), "repo-check", "cloned-repo").unwrap();
        let second = Workspace::create(parent.path(), "repo-check", "cloned-repo").unwrap();

        assert_ne!(first.root(), second.root());
        assert!(first.root().is_dir());
        assert!(second.root().is_dir());
        assert_eq!(first.clone_dir(), first.root().join("cloned-repo"));
        assert_eq!(first.state(), WorkspaceState::Created);
        let name = first.root().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("repo-check-"));
    }

    #[test]
    fn test_release_removes_the_whole_tree() {
        let parent = TempDir::new().unwrap();
        let workspace = Workspace::create(parent.path(), "repo-check", "cloned-repo").unwrap();
        let root = workspace.root().to_path_buf();
        fs::create_dir_all(workspace.clone_dir().join("src")).unwrap();
        fs::write(workspace.clone_dir().join("README.md"), "hello").unwrap();

        assert!(workspace.release());
        assert!(!root.exists());
    }

    #[test]
    fn test_drop_releases_unreleased_workspace() {
        let parent = TempDir::new().unwrap();
        let root = {
            let mut workspace =
                Workspace::create(parent.path(), "repo-check", "cloned-repo").unwrap();
            workspace.mark_populated();
            workspace.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_release_tolerates_already_missing_directory() {
        let parent = TempDir::new().unwrap();
        let workspace = Workspace::create(parent.path(), "repo-check", "cloned-repo").unwrap();
        fs::remove_dir_all(workspace.root()).unwrap();
        assert!(workspace.release());
    }

    #[test]
    fn test_create_builds_missing_parent() {
        let parent = TempDir::new().unwrap();
        let nested = parent.path().join("a").join("b");
        let workspace = Workspace::create(&nested, "repo-check", "cloned-repo").unwrap();
        assert!(workspace.root().starts_with(&nested));
    }
}
