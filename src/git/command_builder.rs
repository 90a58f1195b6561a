//! Fluent builder for executing `git` as a child process.
//!
//! Every git invocation in recipedb goes through [`GitCommand`] so that logging,
//! timeouts and error mapping are uniform. Commands log under the `git` target and
//! slow commands are reported under `git::perf`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::DEFAULT_GIT_TIMEOUT;
use crate::core::RecipeError;

/// Name of the git executable for the current platform.
#[must_use]
pub const fn git_command() -> &'static str {
    if cfg!(windows) { "git.exe" } else { "git" }
}

/// Builder for a single git invocation.
///
/// # Examples
///
/// ```rust,no_run
/// use recipedb_cli::git::command_builder::GitCommand;
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let listing = GitCommand::ls_remote_tags("https://github.com/quarkusio/gizmo.git")
///     .with_timeout(Some(Duration::from_secs(30)))
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// New commands capture output and time out after
/// [`DEFAULT_GIT_TIMEOUT`](crate::constants::DEFAULT_GIT_TIMEOUT).
pub struct GitCommand {
    /// Arguments after the executable name
    args: Vec<String>,

    /// Directory passed to git via `-C`
    current_dir: Option<PathBuf>,

    /// Environment overrides for the child process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Label prefixed to log lines, usually the repository URL
    context: Option<String>,

    /// For clone commands, the URL reported in [`RecipeError::GitCloneFailed`]
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            // Never block on a credential prompt
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout_duration: Some(DEFAULT_GIT_TIMEOUT),
            context: None,
            clone_url: None,
        }
    }
}

impl GitCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the command inside `dir` (passed to git as `-C dir`).
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    #[must_use]
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Label used in log lines to tell concurrent invocations apart.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn log_prefix(&self) -> String {
        self.context.as_ref().map(|c| format!("({c}) ")).unwrap_or_default()
    }

    /// The git sub-command, ignoring a leading `-C <dir>`.
    fn operation(full_args: &[String]) -> String {
        let skip = if full_args.first().is_some_and(|a| a == "-C") { 2 } else { 0 };
        full_args.get(skip).cloned().unwrap_or_else(|| "unknown".to_string())
    }

    /// Execute the command and return its captured output.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::GitCommandError`] on a non-zero exit or timeout,
    /// [`RecipeError::GitCloneFailed`] for a failed clone, and an I/O error if the
    /// process could not be spawned.
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let start = std::time::Instant::now();
        let prefix = self.log_prefix();
        let mut cmd = Command::new(git_command());

        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        let operation = Self::operation(&full_args);

        cmd.args(&full_args);
        tracing::debug!(target: "git", "{}Executing command: {} {}", prefix, git_command(), full_args.join(" "));

        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output_future = cmd.output();
        let output = if let Some(duration) = self.timeout_duration {
            if let Ok(result) = timeout(duration, output_future).await {
                result.with_context(|| format!("Failed to execute git {}", full_args.join(" ")))?
            } else {
                tracing::warn!(
                    target: "git",
                    "{}Command timed out after {} seconds: git {}",
                    prefix,
                    duration.as_secs(),
                    full_args.join(" ")
                );
                return Err(RecipeError::GitCommandError {
                    operation,
                    stderr: format!(
                        "Git command timed out after {} seconds: git {}",
                        duration.as_secs(),
                        full_args.join(" ")
                    ),
                }
                .into());
            }
        } else {
            output_future
                .await
                .with_context(|| format!("Failed to execute git {}", full_args.join(" ")))?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::debug!(
                target: "git",
                "{}Command failed with exit code: {:?}: {}",
                prefix,
                output.status.code(),
                stderr.trim()
            );

            let error = if operation == "clone" {
                RecipeError::GitCloneFailed {
                    url: self.clone_url.unwrap_or_else(|| "unknown".to_string()),
                    reason: stderr,
                }
            } else {
                RecipeError::GitCommandError {
                    operation,
                    stderr,
                }
            };
            return Err(error.into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.trim().is_empty() {
            tracing::trace!(target: "git", "{}{}", prefix, stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "git::perf", "{}Git {} took {:.2}s", prefix, operation, elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "git::perf", "{}Git {} took {}ms", prefix, operation, elapsed.as_millis());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Execute the command and return only stdout as a trimmed string
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Execute the command and discard its output
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Output from a git command
#[derive(Debug)]
pub struct GitCommandOutput {
    /// Standard output from the git command
    pub stdout: String,
    /// Standard error output from the git command
    pub stderr: String,
}

// Convenience builders for the operations recipedb needs

impl GitCommand {
    /// `git clone --branch <branch> <url> <target>`
    #[must_use]
    pub fn clone_branch(url: &str, branch: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new().args([
            "clone".to_string(),
            "--branch".to_string(),
            branch.to_string(),
            "--single-branch".to_string(),
            url.to_string(),
            target.as_ref().display().to_string(),
        ]);
        cmd.clone_url = Some(url.to_string());
        cmd
    }

    /// Fast-forward only pull of the checked out branch.
    #[must_use]
    pub fn pull() -> Self {
        Self::new().args(["pull", "--ff-only", "--quiet"])
    }

    /// Lists every tag of a remote without cloning it.
    #[must_use]
    pub fn ls_remote_tags(url: &str) -> Self {
        Self::new().args(["ls-remote", "--tags", url])
    }

    #[must_use]
    pub fn current_commit() -> Self {
        Self::new().args(["rev-parse", "HEAD"])
    }
}
