use crate::core::repository::{
    DEFAULT_CLONE_SUBPATH, DEFAULT_EXPECTED_FILE, DEFAULT_LINK_HOST, DEFAULT_WORKSPACE_PREFIX,
};
use crate::core::cart::CartPanel;
use crate::core::catalogue::ProductPage;
use crate::core::wait::WaitPolicy;
use crate::domain::ports::{RepositoryCheckConfig, UiDriver};
use crate::utils::error::{HarnessError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const ENV_VAR_PATTERN: &str = r"\$\{([^}]+)\}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub storefront: StorefrontConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub waits: WaitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Skips scraping the storefront for its repository link.
    pub url: Option<String>,
    pub link_host: String,
    pub expected_file: String,
    pub clone_subpath: String,
    pub workspace_root: Option<String>,
    pub workspace_prefix: String,
    pub request_timeout_seconds: u64,
    pub clone_timeout_seconds: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: None,
            link_host: DEFAULT_LINK_HOST.to_string(),
            expected_file: DEFAULT_EXPECTED_FILE.to_string(),
            clone_subpath: DEFAULT_CLONE_SUBPATH.to_string(),
            workspace_root: None,
            workspace_prefix: DEFAULT_WORKSPACE_PREFIX.to_string(),
            request_timeout_seconds: 30,
            clone_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitsConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitsConfig {
    fn default() -> Self {
        let policy = WaitPolicy::default();
        Self {
            timeout_ms: policy.timeout.as_millis() as u64,
            poll_interval_ms: policy.poll_interval.as_millis() as u64,
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HarnessError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| HarnessError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(ENV_VAR_PATTERN)?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("storefront.base_url", &self.storefront.base_url)?;

        if let Some(url) = &self.repository.url {
            validation::validate_url("repository.url", url)?;
        }
        validation::validate_non_empty_string("repository.link_host", &self.repository.link_host)?;
        validation::validate_relative_path(
            "repository.expected_file",
            &self.repository.expected_file,
        )?;
        validation::validate_relative_path(
            "repository.clone_subpath",
            &self.repository.clone_subpath,
        )?;
        if let Some(root) = &self.repository.workspace_root {
            validation::validate_path("repository.workspace_root", root)?;
        }
        validation::validate_non_empty_string(
            "repository.workspace_prefix",
            &self.repository.workspace_prefix,
        )?;
        validation::validate_positive_number(
            "repository.request_timeout_seconds",
            self.repository.request_timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "repository.clone_timeout_seconds",
            self.repository.clone_timeout_seconds,
            1,
        )?;

        let policy = self.wait_policy();
        validation::validate_wait("waits", policy.timeout, policy.poll_interval)?;

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.storefront.base_url
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.waits.timeout_ms),
            Duration::from_millis(self.waits.poll_interval_ms),
        )
    }

    /// Catalogue model that waits as `[waits]` says.
    pub fn product_page<D: UiDriver + ?Sized>(&self, driver: Arc<D>) -> ProductPage<D> {
        ProductPage::new(driver).with_wait_policy(self.wait_policy())
    }

    pub fn cart_panel<D: UiDriver + ?Sized>(&self, driver: Arc<D>) -> CartPanel<D> {
        CartPanel::new(driver).with_wait_policy(self.wait_policy())
    }
}

impl RepositoryCheckConfig for TomlConfig {
    fn repository_url(&self) -> Option<&str> {
        self.repository.url.as_deref()
    }

    fn link_host(&self) -> &str {
        &self.repository.link_host
    }

    fn expected_file(&self) -> &str {
        &self.repository.expected_file
    }

    fn clone_subpath(&self) -> &str {
        &self.repository.clone_subpath
    }

    fn workspace_root(&self) -> Option<&str> {
        self.repository.workspace_root.as_deref()
    }

    fn workspace_prefix(&self) -> &str {
        &self.repository.workspace_prefix
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.repository.request_timeout_seconds)
    }

    fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.repository.clone_timeout_seconds)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
