use crate::core::workspace::Workspace;
use crate::domain::locator::{Locator, Selector};
use crate::domain::model::{RepositoryReference, ValidationFailure, ValidationReport};
use crate::domain::ports::{
    NetworkProbe, ReferenceSource, RepositoryCheckConfig, RepositoryCloner, UiDriver,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_EXPECTED_FILE: &str = "README.md";
pub const DEFAULT_CLONE_SUBPATH: &str = "cloned-repo";
pub const DEFAULT_WORKSPACE_PREFIX: &str = "storefront-repo-check";
pub const DEFAULT_LINK_HOST: &str = "github.com";

#[derive(Debug, Clone)]
pub struct RepositoryCheckSettings {
    pub expected_file: String,
    pub clone_subpath: String,
    pub workspace_root: PathBuf,
    pub workspace_prefix: String,
    pub clone_timeout: Duration,
}

impl Default for RepositoryCheckSettings {
    fn default() -> Self {
        Self {
            expected_file: DEFAULT_EXPECTED_FILE.to_string(),
            clone_subpath: DEFAULT_CLONE_SUBPATH.to_string(),
            workspace_root: std::env::temp_dir(),
            workspace_prefix: DEFAULT_WORKSPACE_PREFIX.to_string(),
            clone_timeout: Duration::from_secs(120),
        }
    }
}

impl RepositoryCheckSettings {
    pub fn from_config<C: RepositoryCheckConfig + ?Sized>(config: &C) -> Self {
        Self {
            expected_file: config.expected_file().to_string(),
            clone_subpath: config.clone_subpath().to_string(),
            workspace_root: config
                .workspace_root()
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            workspace_prefix: config.workspace_prefix().to_string(),
            clone_timeout: config.clone_timeout(),
        }
    }
}

/// Reads the repository link from the rendered storefront: the `href` of the first link
/// pointing at `host`.
pub struct PageReferenceSource<D: UiDriver + ?Sized> {
    driver: Arc<D>,
    link: Locator,
}

impl<D: UiDriver + ?Sized> PageReferenceSource<D> {
    pub fn new(driver: Arc<D>, host: &str) -> Self {
        Self {
            driver,
            link: Locator::new(Selector::attr_contains("href", host)).first(),
        }
    }
}

#[async_trait]
impl<D: UiDriver + ?Sized> ReferenceSource for PageReferenceSource<D> {
    async fn fetch_reference(&self) -> Result<Option<String>> {
        let Some(handle) = self.driver.locate(&self.link).await?.into_iter().next() else {
            return Ok(None);
        };
        self.driver.read_attribute(&handle, "href").await
    }
}

/// A reference known up front, e.g. passed on the command line.
#[derive(Debug, Clone)]
pub struct StaticReference(pub String);

#[async_trait]
impl ReferenceSource for StaticReference {
    async fn fetch_reference(&self) -> Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

/// Checks that the storefront's source repository is public, clonable and carries the
/// expected file.
///
/// Stages run strictly in order; the clone workspace is released exactly once on every
/// path out of [`RepositoryValidationPipeline::run`].
pub struct RepositoryValidationPipeline<R, N, C> {
    source: R,
    probe: N,
    cloner: C,
    settings: RepositoryCheckSettings,
}

impl<R, N, C> RepositoryValidationPipeline<R, N, C>
where
    R: ReferenceSource,
    N: NetworkProbe,
    C: RepositoryCloner,
{
    pub fn new(source: R, probe: N, cloner: C, settings: RepositoryCheckSettings) -> Self {
        Self {
            source,
            probe,
            cloner,
            settings,
        }
    }

    pub fn settings(&self) -> &RepositoryCheckSettings {
        &self.settings
    }

    pub async fn run(&self) -> Result<ValidationReport> {
        let started_at = chrono::Utc::now();
        tracing::info!("Starting repository validation");

        let reference = self.extract_reference().await?;
        tracing::info!("Repository reference: {}", reference);

        self.verify_reachable(&reference).await?;
        tracing::info!("{} is reachable", reference);

        let mut workspace = self.clone_repository(&reference).await?;
        tracing::info!("Cloned into {}", workspace.clone_dir().display());

        let expected_file_size = self.verify_contents(&workspace.clone_dir())?;
        workspace.mark_verified();
        tracing::info!(
            "{} present ({} bytes)",
            self.settings.expected_file,
            expected_file_size
        );

        let workspace_path = workspace.root().to_path_buf();
        workspace.release();

        Ok(ValidationReport {
            reference,
            expected_file: self.settings.expected_file.clone(),
            expected_file_size,
            workspace: workspace_path,
            started_at,
            finished_at: chrono::Utc::now(),
        })
    }

    pub async fn extract_reference(&self) -> Result<RepositoryReference> {
        let raw = self.source.fetch_reference().await.map_err(|e| {
            ValidationFailure::ReferenceMissing {
                reason: e.to_string(),
            }
        })?;
        Ok(RepositoryReference::parse(raw.as_deref())?)
    }

    pub async fn verify_reachable(&self, reference: &RepositoryReference) -> Result<()> {
        let status = self.probe.status(reference.url()).await.map_err(|e| {
            tracing::debug!("Probe of {} failed: {}", reference, e);
            ValidationFailure::ResourceUnreachable {
                url: reference.url().to_string(),
                status: None,
            }
        })?;
        if status != 200 {
            return Err(ValidationFailure::ResourceUnreachable {
                url: reference.url().to_string(),
                status: Some(status),
            }
            .into());
        }
        Ok(())
    }

    /// Allocates a fresh workspace and clones into its fixed subpath. Any failure drops,
    /// and so releases, the workspace before the error is returned.
    pub async fn clone_repository(&self, reference: &RepositoryReference) -> Result<Workspace> {
        let mut workspace = Workspace::create(
            &self.settings.workspace_root,
            &self.settings.workspace_prefix,
            &self.settings.clone_subpath,
        )
        .map_err(|e| ValidationFailure::CloneFailure {
            reason: format!("could not create workspace: {}", e),
        })?;
        let destination = workspace.clone_dir();

        let cloned = tokio::time::timeout(
            self.settings.clone_timeout,
            self.cloner.clone_into(reference, &destination),
        )
        .await;
        match cloned {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(ValidationFailure::CloneFailure {
                    reason: e.to_string(),
                }
                .into())
            }
            Err(_) => {
                return Err(ValidationFailure::CloneFailure {
                    reason: format!(
                        "clone did not finish within {:?}",
                        self.settings.clone_timeout
                    ),
                }
                .into())
            }
        }

        if !destination.is_dir() {
            return Err(ValidationFailure::CloneFailure {
                reason: "clone directory was not created".to_string(),
            }
            .into());
        }
        workspace.mark_populated();
        Ok(workspace)
    }

    /// Size of the expected file at the clone root; it must be a non-empty regular file.
    pub fn verify_contents(&self, clone_dir: &Path) -> Result<u64> {
        let path = clone_dir.join(&self.settings.expected_file);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ValidationFailure::MissingExpectedFile { path }.into())
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(ValidationFailure::MissingExpectedFile { path }.into());
        }
        if metadata.len() == 0 {
            return Err(ValidationFailure::EmptyExpectedFile { path }.into());
        }
        Ok(metadata.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PipelineStage;
    use crate::utils::error::HarnessError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct MockProbe {
        status: u16,
        requested: Mutex<Vec<String>>,
    }

    impl MockProbe {
        fn new(status: u16) -> Self {
            Self {
                status,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NetworkProbe for MockProbe {
        async fn status(&self, url: &str) -> Result<u16> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.status)
        }
    }

    enum CloneBehaviour {
        Files(Vec<(&'static str, &'static str)>),
        Fail,
        NoDirectory,
        Hang,
    }

    struct MockCloner {
        behaviour: CloneBehaviour,
    }

    #[async_trait]
    impl RepositoryCloner for MockCloner {
        async fn clone_into(
            &self,
            _reference: &RepositoryReference,
            destination: &Path,
        ) -> Result<()> {
            match &self.behaviour {
                CloneBehaviour::Files(files) => {
                    fs::create_dir_all(destination)?;
                    for (name, content) in files {
                        fs::write(destination.join(name), content)?;
                    }
                    Ok(())
                }
                CloneBehaviour::Fail => Err(HarnessError::driver("remote hung up")),
                CloneBehaviour::NoDirectory => Ok(()),
                CloneBehaviour::Hang => {
                    fs::create_dir_all(destination)?;
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }
    }

    fn pipeline(
        root: &TempDir,
        reference: Option<&str>,
        status: u16,
        behaviour: CloneBehaviour,
    ) -> RepositoryValidationPipeline<StaticReference, MockProbe, MockCloner> {
        let settings = RepositoryCheckSettings {
            workspace_root: root.path().to_path_buf(),
            ..RepositoryCheckSettings::default()
        };
        RepositoryValidationPipeline::new(
            StaticReference(reference.unwrap_or_default().to_string()),
            MockProbe::new(status),
            MockCloner { behaviour },
            settings,
        )
    }

    fn leftover_entries(root: &TempDir) -> usize {
        fs::read_dir(root.path()).unwrap().count()
    }

    fn failure_stage(err: HarnessError) -> PipelineStage {
        match err {
            HarnessError::Validation(failure) => failure.stage(),
            other => panic!("expected a validation failure, got {:?}", other),
        }
    }

    const REPO: &str = "https://github.com/acme/storefront";

    #[tokio::test]
    async fn test_successful_run_releases_workspace() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(
            &root,
            Some(REPO),
            200,
            CloneBehaviour::Files(vec![("README.md", "# Storefront"), ("package.json", "{}")]),
        );

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.reference.url(), REPO);
        assert_eq!(report.expected_file, "README.md");
        assert_eq!(report.expected_file_size, 12);
        assert!(!report.workspace.exists());
        assert!(report.workspace.starts_with(root.path()));
        assert_eq!(leftover_entries(&root), 0);
        assert_eq!(*pipeline.probe.requested.lock().unwrap(), vec![REPO.to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_reference_fails_before_any_workspace() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(&root, Some(REPO), 404, CloneBehaviour::Files(vec![]));

        let err = pipeline.run().await.unwrap_err();

        assert!(err.to_string().contains("404"));
        assert_eq!(failure_stage(err), PipelineStage::VerifyReachable);
        assert_eq!(leftover_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_redirect_status_is_not_success() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(&root, Some(REPO), 301, CloneBehaviour::Files(vec![]));

        let err = pipeline.run().await.unwrap_err();
        assert_eq!(failure_stage(err), PipelineStage::VerifyReachable);
    }

    #[tokio::test]
    async fn test_missing_reference_fails_at_stage_one() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(&root, None, 200, CloneBehaviour::Files(vec![]));

        let err = pipeline.run().await.unwrap_err();

        assert_eq!(failure_stage(err), PipelineStage::ExtractReference);
        assert!(pipeline.probe.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_expected_file_still_releases_workspace() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(
            &root,
            Some(REPO),
            200,
            CloneBehaviour::Files(vec![("index.html", "<html></html>")]),
        );

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(
            &err,
            HarnessError::Validation(ValidationFailure::MissingExpectedFile { .. })
        ));
        assert_eq!(failure_stage(err), PipelineStage::VerifyContents);
        assert_eq!(leftover_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_empty_expected_file_is_rejected() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(
            &root,
            Some(REPO),
            200,
            CloneBehaviour::Files(vec![("README.md", "")]),
        );

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(
            err,
            HarnessError::Validation(ValidationFailure::EmptyExpectedFile { .. })
        ));
        assert_eq!(leftover_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_clone_error_releases_workspace() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(&root, Some(REPO), 200, CloneBehaviour::Fail);

        let err = pipeline.run().await.unwrap_err();

        assert!(err.to_string().contains("remote hung up"));
        assert_eq!(failure_stage(err), PipelineStage::Clone);
        assert_eq!(leftover_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_clone_without_directory_is_a_clone_failure() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(&root, Some(REPO), 200, CloneBehaviour::NoDirectory);

        let err = pipeline.run().await.unwrap_err();

        assert!(err.to_string().contains("clone directory was not created"));
        assert_eq!(leftover_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_expected_path_that_is_a_directory_counts_as_missing() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(&root, Some(REPO), 200, CloneBehaviour::Files(vec![]));
        let clone_dir = root.path().join("manual");
        fs::create_dir_all(clone_dir.join("README.md")).unwrap();

        let err = pipeline.verify_contents(&clone_dir).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Validation(ValidationFailure::MissingExpectedFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_run_still_releases_workspace() {
        let root = TempDir::new().unwrap();
        let pipeline = pipeline(&root, Some(REPO), 200, CloneBehaviour::Hang);

        let outcome = tokio::time::timeout(Duration::from_millis(100), pipeline.run()).await;

        assert!(outcome.is_err());
        assert_eq!(leftover_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_clone_timeout_is_a_clone_failure() {
        let root = TempDir::new().unwrap();
        let mut pipeline = pipeline(&root, Some(REPO), 200, CloneBehaviour::Hang);
        pipeline.settings.clone_timeout = Duration::from_millis(50);

        let err = pipeline.run().await.unwrap_err();

        assert!(err.to_string().contains("did not finish within 50ms"));
        assert_eq!(failure_stage(err), PipelineStage::Clone);
        assert_eq!(leftover_entries(&root), 0);
    }
}
