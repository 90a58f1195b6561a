//! Git operations for recipedb
//!
//! recipedb talks to git through the system `git` binary rather than an embedded
//! library, so credential helpers, SSH agents and proxies configured for git work
//! unchanged. Two kinds of access are needed:
//!
//! - **Remote tag listing** ([`list_remote_tags`]): `git ls-remote --tags` against a
//!   source repository, used by the tag resolver. No clone is made.
//! - **Recipe checkouts** ([`GitRepo`]): clone a recipe database repository at a
//!   branch and fast-forward it on refresh.
//!
//! Both go through [`command_builder::GitCommand`], which applies timeouts and maps
//! failures onto [`RecipeError`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use recipedb_cli::git::list_remote_tags;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let tags = list_remote_tags("https://github.com/quarkusio/gizmo.git", None).await?;
//! if let Some(hash) = tags.get("1.0.0.Final") {
//!     println!("1.0.0.Final is {hash}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod command_builder;

use crate::core::RecipeError;
use crate::git::command_builder::GitCommand;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Branch checked out when a recipe repository URL carries no `#branch` suffix.
pub const DEFAULT_BRANCH: &str = "main";

/// A local git checkout.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Wraps an existing checkout. The path is not validated.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Clones `branch` of `url` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::GitCloneFailed`] if git reports a failure.
    pub async fn clone_branch(
        url: &str,
        branch: &str,
        target: impl AsRef<Path>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let target = target.as_ref();
        tracing::info!("Cloning {} (branch {}) into {}", url, branch, target.display());
        GitCommand::clone_branch(url, branch, target)
            .with_timeout(timeout)
            .with_context(url)
            .execute_success()
            .await?;
        Ok(Self::new(target))
    }

    /// Fast-forwards the checked out branch from its upstream.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::GitCommandError`] if the pull fails, including when
    /// the branch has diverged.
    pub async fn pull(&self, timeout: Option<Duration>) -> Result<()> {
        GitCommand::pull()
            .current_dir(&self.path)
            .with_timeout(timeout)
            .execute_success()
            .await
            .with_context(|| format!("Failed to update recipe checkout {}", self.path.display()))
    }

    /// Hash of the checked out commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is not a git checkout.
    pub async fn current_commit(&self) -> Result<String> {
        GitCommand::current_commit().current_dir(&self.path).execute_stdout().await
    }

    #[must_use]
    pub fn is_git_repo(&self) -> bool {
        is_valid_git_repo(&self.path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lists the tags of a remote repository as `tag name -> commit hash`.
///
/// Annotated tags are reported with the hash of the commit they point at (the
/// peeled `^{}` entry), not the tag object.
///
/// # Errors
///
/// Returns [`RecipeError::GitCommandError`] if the remote cannot be listed,
/// including on timeout.
pub async fn list_remote_tags(url: &str, timeout: Option<Duration>) -> Result<HashMap<String, String>> {
    let mut cmd = GitCommand::ls_remote_tags(url).with_context(url);
    if timeout.is_some() {
        cmd = cmd.with_timeout(timeout);
    }
    let stdout = cmd.execute_stdout().await?;
    let tags = parse_ls_remote_tags(&stdout);
    tracing::debug!("Found {} tags in {}", tags.len(), url);
    Ok(tags)
}

/// Parses `git ls-remote --tags` output.
#[must_use]
pub fn parse_ls_remote_tags(output: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    let mut peeled = HashMap::new();

    for line in output.lines() {
        let Some((hash, reference)) = line.split_once('\t') else {
            continue;
        };
        let Some(name) = reference.trim().strip_prefix("refs/tags/") else {
            continue;
        };
        if let Some(name) = name.strip_suffix("^{}") {
            peeled.insert(name.to_string(), hash.trim().to_string());
        } else {
            tags.insert(name.to_string(), hash.trim().to_string());
        }
    }

    tags.extend(peeled);
    tags
}

/// Splits a `url#branch` recipe repository reference. The branch defaults to
/// [`DEFAULT_BRANCH`].
#[must_use]
pub fn split_branch(reference: &str) -> (&str, &str) {
    match reference.rsplit_once('#') {
        Some((url, branch)) if !branch.is_empty() => (url, branch),
        Some((url, _)) => (url, DEFAULT_BRANCH),
        None => (reference, DEFAULT_BRANCH),
    }
}

/// Whether a git executable can be found on `PATH`.
#[must_use]
pub fn is_git_installed() -> bool {
    which::which(command_builder::git_command()).is_ok()
}

/// Fails with [`RecipeError::GitNotFound`] if git is not installed.
///
/// # Errors
///
/// Returns [`RecipeError::GitNotFound`] when [`is_git_installed`] is false.
pub fn ensure_git_available() -> Result<()> {
    if !is_git_installed() {
        return Err(RecipeError::GitNotFound.into());
    }
    Ok(())
}

/// Whether `path` contains a `.git` directory (or file, for worktrees).
#[must_use]
pub fn is_valid_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}
