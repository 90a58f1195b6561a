//! Configuration for recipedb
//!
//! Settings are read from a TOML file, by default `~/.recipedb/config.toml`
//! (`%LOCALAPPDATA%\recipedb\config.toml` on Windows). The location can be
//! overridden with `--config` or the `RECIPEDB_CONFIG` environment variable. A
//! missing file is not an error; every setting has a default.
//!
//! ```toml
//! # Recipe repositories, highest priority first. Append `#branch` to pick a branch.
//! recipe_repos = [
//!     "https://github.com/acme/recipe-overrides.git#stable",
//!     "https://github.com/redhat-appstudio/jvm-build-data",
//! ]
//! # Plain directories searched before any repository
//! local_recipe_dirs = ["~/work/recipes"]
//! cache_url = "https://repo.maven.apache.org/maven2"
//! update_interval_secs = 300
//! cache_repo_tags = true
//! git_timeout_secs = 120
//! http_timeout_secs = 30
//! checkout_dir = "~/.recipedb/checkouts"
//! ```

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_ENV_VAR, DEFAULT_CACHE_URL, DEFAULT_GIT_TIMEOUT, DEFAULT_HTTP_TIMEOUT,
    DEFAULT_RECIPE_REPO,
};
use crate::core::RecipeError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

fn default_recipe_repos() -> Vec<String> {
    vec![DEFAULT_RECIPE_REPO.to_string()]
}

fn default_cache_url() -> String {
    DEFAULT_CACHE_URL.to_string()
}

/// Settings for building a [`RecipeResolver`](crate::resolver::RecipeResolver) and
/// a [`ScmTagResolver`](crate::scm::ScmTagResolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Git recipe databases as `url[#branch]`, highest priority first
    pub recipe_repos: Vec<String>,

    /// Local recipe databases, searched before `recipe_repos`
    pub local_recipe_dirs: Vec<PathBuf>,

    /// Base URL of the Maven artifact cache used for POM discovery
    pub cache_url: String,

    /// Minimum time between pulls of a recipe repository. No pulls when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_interval_secs: Option<u64>,

    /// Reuse remote tag listings for the lifetime of the tag resolver
    pub cache_repo_tags: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// Where recipe repositories are cloned. A temporary directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_dir: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            recipe_repos: default_recipe_repos(),
            local_recipe_dirs: Vec::new(),
            cache_url: default_cache_url(),
            update_interval_secs: None,
            cache_repo_tags: false,
            git_timeout_secs: None,
            http_timeout_secs: None,
            checkout_dir: None,
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }

    /// Loads the configuration from `path`, or else from `RECIPEDB_CONFIG`, or
    /// else from the default location. Missing files yield the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match std::env::var_os(CONFIG_ENV_VAR) {
                Some(env_path) => PathBuf::from(env_path),
                None => match Self::default_path() {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::debug!("No default config location: {e}");
                        return Ok(Self::default());
                    }
                },
            },
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Loads the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or names an
    /// unusable value.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .map_err(RecipeError::from)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Platform default config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("recipedb")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(CONFIG_DIR_NAME)
        };
        Ok(config_dir.join("config.toml"))
    }

    fn expand_paths(&mut self) -> Result<()> {
        for dir in &mut self.local_recipe_dirs {
            *dir = expand_path(dir)?;
        }
        if let Some(dir) = &self.checkout_dir {
            self.checkout_dir = Some(expand_path(dir)?);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.cache_url.trim().is_empty() {
            return Err(RecipeError::ConfigError {
                message: "cache_url must not be empty".to_string(),
            }
            .into());
        }
        if let Some(bad) = self.recipe_repos.iter().find(|r| r.trim().is_empty()) {
            return Err(RecipeError::ConfigError {
                message: format!("invalid recipe repository '{bad}'"),
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub fn git_timeout(&self) -> Duration {
        self.git_timeout_secs.map_or(DEFAULT_GIT_TIMEOUT, Duration::from_secs)
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs.map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs)
    }

    #[must_use]
    pub fn update_interval(&self) -> Option<Duration> {
        self.update_interval_secs.map(Duration::from_secs)
    }
}

/// Expands `~` and environment variables in a configured path.
fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).map_err(|e| RecipeError::ConfigError {
        message: format!("cannot expand path '{raw}': {e}"),
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Fluent construction of a [`ResolverConfig`], starting from the defaults.
///
/// ```rust
/// use recipedb_cli::config::ResolverConfig;
///
/// let config = ResolverConfig::builder()
///     .local_recipe_dir("/srv/recipes")
///     .no_recipe_repos()
///     .cache_repo_tags(true)
///     .build();
/// assert!(config.recipe_repos.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    /// Appends a repository after the current ones, including the default
    /// repository unless [`no_recipe_repos`](Self::no_recipe_repos) was called.
    #[must_use]
    pub fn recipe_repo(mut self, reference: impl Into<String>) -> Self {
        self.config.recipe_repos.push(reference.into());
        self
    }

    /// Replaces the recipe repository list.
    #[must_use]
    pub fn recipe_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.recipe_repos = repos.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn no_recipe_repos(mut self) -> Self {
        self.config.recipe_repos.clear();
        self
    }

    #[must_use]
    pub fn local_recipe_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.local_recipe_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn cache_url(mut self, url: impl Into<String>) -> Self {
        self.config.cache_url = url.into();
        self
    }

    #[must_use]
    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.config.update_interval_secs = Some(interval.as_secs());
        self
    }

    #[must_use]
    pub const fn cache_repo_tags(mut self, enabled: bool) -> Self {
        self.config.cache_repo_tags = enabled;
        self
    }

    #[must_use]
    pub fn git_timeout(mut self, timeout: Duration) -> Self {
        self.config.git_timeout_secs = Some(timeout.as_secs());
        self
    }

    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout_secs = Some(timeout.as_secs());
        self
    }

    #[must_use]
    pub fn checkout_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.checkout_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ResolverConfig {
        self.config
    }
}
