//! Git test helper utilities
//!
//! Builds throwaway repositories (recipe databases, tagged source repositories)
//! that tests then clone or list over `file://` URLs.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs git against one test repository.
///
/// Use this instead of raw `std::process::Command` for git operations in tests.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Creates the directory, runs `git init` and configures a committer.
    pub fn init_repo(repo_path: impl Into<PathBuf>) -> Result<Self> {
        let git = Self::new(repo_path);
        std::fs::create_dir_all(&git.repo_path)
            .with_context(|| format!("Failed to create {}", git.repo_path.display()))?;
        git.init()?;
        git.config_user()?;
        Ok(git)
    }

    pub fn init(&self) -> Result<()> {
        self.run_git_command(&["init"], "Failed to initialize git repository")?;
        Ok(())
    }

    /// Configure git user for tests
    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(
            &["config", "user.email", "test@recipedb.example"],
            "Failed to configure git user email",
        )?;
        self.run_git_command(&["config", "user.name", "Test User"], "Failed to configure git user name")?;
        self.run_git_command(&["config", "tag.gpgSign", "false"], "Failed to disable tag signing")?;
        self.run_git_command(&["config", "commit.gpgSign", "false"], "Failed to disable commit signing")?;
        Ok(())
    }

    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "."], "Failed to add files to git")?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(&["commit", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    /// Writes `relative` (creating parent directories), then stages and commits it.
    pub fn commit_file(&self, relative: &str, content: &str, message: &str) -> Result<()> {
        let path = self.repo_path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        self.add_all()?;
        self.commit(message)
    }

    /// Lightweight tag on HEAD
    pub fn tag(&self, tag_name: &str) -> Result<()> {
        self.run_git_command(&["tag", tag_name], &format!("Failed to create tag: {tag_name}"))?;
        Ok(())
    }

    /// Annotated tag on HEAD. Its tag object hash differs from the commit hash.
    pub fn annotated_tag(&self, tag_name: &str, message: &str) -> Result<()> {
        self.run_git_command(
            &["tag", "-a", tag_name, "-m", message],
            &format!("Failed to create annotated tag: {tag_name}"),
        )?;
        Ok(())
    }

    /// Ensure we're on a specific branch, creating it if it doesn't exist.
    /// Useful when the default branch name is unknown (master vs main).
    pub fn ensure_branch(&self, branch_name: &str) -> Result<()> {
        if self.run_git_command(&["checkout", branch_name], "Failed to checkout branch").is_ok() {
            return Ok(());
        }
        self.run_git_command(
            &["checkout", "-b", branch_name],
            &format!("Failed to create branch: {branch_name}"),
        )?;
        Ok(())
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// `file://` URL of this repository, as used for clones and `ls-remote`
    pub fn file_url(&self) -> String {
        format!("file://{}", self.repo_path.display())
    }

    /// Current commit hash
    pub fn get_commit_hash(&self) -> Result<String> {
        self.rev_parse("HEAD")
    }

    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        let output = self.run_git_command(&["rev-parse", rev], &format!("Failed to resolve {rev}"))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
