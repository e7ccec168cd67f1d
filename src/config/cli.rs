use crate::config::toml_config::{RepositoryConfig, StorefrontConfig, TomlConfig};
use crate::domain::ports::RepositoryCheckConfig;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STOREFRONT_URL: &str = "http://localhost:3000/";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "storefront-acceptance")]
#[command(about = "Checks that a storefront links to a cloneable source repository")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file; flags override its values")]
    pub config: Option<String>,

    #[arg(long, help = "Storefront page that carries the repository link")]
    pub page_url: Option<String>,

    #[arg(long, help = "Repository URL to check instead of scraping the page")]
    pub repo_url: Option<String>,

    #[arg(long)]
    pub link_host: Option<String>,

    #[arg(long)]
    pub expected_file: Option<String>,

    #[arg(long)]
    pub clone_subpath: Option<String>,

    #[arg(long)]
    pub workspace_root: Option<String>,

    #[arg(long)]
    pub workspace_prefix: Option<String>,

    #[arg(long)]
    pub request_timeout_seconds: Option<u64>,

    #[arg(long)]
    pub clone_timeout_seconds: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON logs and a JSON report")]
    pub json: bool,
}

impl CliConfig {
    /// Loads `--config` when given and lays the command line flags over it.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig {
                storefront: StorefrontConfig {
                    base_url: DEFAULT_STOREFRONT_URL.to_string(),
                },
                repository: RepositoryConfig::default(),
                waits: Default::default(),
            },
        };

        if let Some(url) = &self.page_url {
            config.storefront.base_url = url.clone();
        }
        let repository = &mut config.repository;
        if let Some(url) = &self.repo_url {
            repository.url = Some(url.clone());
        }
        if let Some(host) = &self.link_host {
            repository.link_host = host.clone();
        }
        if let Some(file) = &self.expected_file {
            repository.expected_file = file.clone();
        }
        if let Some(subpath) = &self.clone_subpath {
            repository.clone_subpath = subpath.clone();
        }
        if let Some(root) = &self.workspace_root {
            repository.workspace_root = Some(root.clone());
        }
        if let Some(prefix) = &self.workspace_prefix {
            repository.workspace_prefix = prefix.clone();
        }
        if let Some(seconds) = self.request_timeout_seconds {
            repository.request_timeout_seconds = seconds;
        }
        if let Some(seconds) = self.clone_timeout_seconds {
            repository.clone_timeout_seconds = seconds;
        }

        config.validate()?;
        Ok(config)
    }
}

// Flag values on their own, without any `--config` file.
impl RepositoryCheckConfig for CliConfig {
    fn repository_url(&self) -> Option<&str> {
        self.repo_url.as_deref()
    }

    fn link_host(&self) -> &str {
        self.link_host
            .as_deref()
            .unwrap_or(crate::core::repository::DEFAULT_LINK_HOST)
    }

    fn expected_file(&self) -> &str {
        self.expected_file
            .as_deref()
            .unwrap_or(crate::core::repository::DEFAULT_EXPECTED_FILE)
    }

    fn clone_subpath(&self) -> &str {
        self.clone_subpath
            .as_deref()
            .unwrap_or(crate::core::repository::DEFAULT_CLONE_SUBPATH)
    }

    fn workspace_root(&self) -> Option<&str> {
        self.workspace_root.as_deref()
    }

    fn workspace_prefix(&self) -> &str {
        self.workspace_prefix
            .as_deref()
            .unwrap_or(crate::core::repository::DEFAULT_WORKSPACE_PREFIX)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_seconds
                .unwrap_or(RepositoryConfig::default().request_timeout_seconds),
        )
    }

    fn clone_timeout(&self) -> Duration {
        Duration::from_secs(
            self.clone_timeout_seconds
                .unwrap_or(RepositoryConfig::default().clone_timeout_seconds),
        )
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        if let Some(url) = &self.page_url {
            validation::validate_url("page_url", url)?;
        }
        if let Some(url) = &self.repo_url {
            validation::validate_url("repo_url", url)?;
        }
        validation::validate_relative_path("expected_file", self.expected_file())?;
        validation::validate_relative_path("clone_subpath", self.clone_subpath())?;
        if let Some(seconds) = self.request_timeout_seconds {
            validation::validate_positive_number("request_timeout_seconds", seconds, 1)?;
        }
        if let Some(seconds) = self.clone_timeout_seconds {
            validation::validate_positive_number("clone_timeout_seconds", seconds, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::HarnessError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flag_defaults() {
        let cli = CliConfig::parse_from(["storefront-acceptance"]);
        assert!(cli.validate().is_ok());
        assert_eq!(cli.expected_file(), "README.md");
        assert_eq!(cli.link_host(), "github.com");
        assert_eq!(cli.clone_timeout(), Duration::from_secs(120));

        let resolved = cli.resolve().unwrap();
        assert_eq!(resolved.base_url(), DEFAULT_STOREFRONT_URL);
        assert_eq!(resolved.repository_url(), None);
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[storefront]
base_url = "https://shop.example.com/"

[repository]
expected_file = "CHANGELOG.md"
clone_timeout_seconds = 30
"#,
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = CliConfig::parse_from([
            "storefront-acceptance",
            "--config",
            &path,
            "--repo-url",
            "https://github.com/acme/shop",
            "--clone-timeout-seconds",
            "10",
        ]);
        let resolved = cli.resolve().unwrap();

        assert_eq!(resolved.base_url(), "https://shop.example.com/");
        assert_eq!(resolved.expected_file(), "CHANGELOG.md");
        assert_eq!(resolved.repository_url(), Some("https://github.com/acme/shop"));
        assert_eq!(resolved.clone_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let cli = CliConfig::parse_from(["storefront-acceptance", "--repo-url", "not a url"]);
        assert!(matches!(
            cli.validate(),
            Err(HarnessError::InvalidConfigValueError { .. })
        ));
        assert!(cli.resolve().is_err());
    }
}
