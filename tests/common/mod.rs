//! Common test utilities for recipedb integration tests

// Not every helper is used by every test file
#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use recipedb_cli::test_utils::{RecipeTree, TestGit};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch area holding recipe databases and source repositories.
pub struct TestWorkspace {
    pub temp: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        recipedb_cli::test_utils::init_test_logging(None);
        Ok(Self {
            temp: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// A plain recipe database directory named `name`
    pub fn database(&self, name: &str) -> RecipeTree {
        RecipeTree::new(self.temp.path().join(name))
    }

    /// A source repository with one commit on `main` and the given lightweight tags
    /// on that commit.
    pub fn source_repo(&self, name: &str, tags: &[&str]) -> Result<TestGit> {
        let git = TestGit::init_repo(self.temp.path().join(name))?;
        git.commit_file("pom.xml", "<project/>\n", "Initial commit")?;
        git.ensure_branch("main")?;
        for tag in tags {
            git.tag(tag)?;
        }
        Ok(git)
    }

    /// A git-backed recipe database with `files` committed on `main`.
    pub fn database_repo(&self, name: &str, files: &[(&str, &str)]) -> Result<TestGit> {
        let git = TestGit::init_repo(self.temp.path().join(name))?;
        for (path, content) in files {
            git.commit_file(path, content, &format!("Add {path}"))?;
        }
        git.ensure_branch("main")?;
        Ok(git)
    }

    /// Path of a config file that does not exist, so commands run on defaults.
    pub fn missing_config(&self) -> PathBuf {
        self.temp.path().join("no-config.toml")
    }

    /// The `recipedb` binary with an isolated configuration.
    pub fn recipedb(&self) -> Command {
        let mut cmd = Command::cargo_bin("recipedb").expect("recipedb binary is built");
        cmd.env("RECIPEDB_CONFIG", self.missing_config())
            .env("HOME", self.temp.path())
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}
