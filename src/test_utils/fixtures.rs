//! Test fixtures for building recipe databases on disk
//!
//! [`RecipeTree`] writes files at the paths the store expects, and
//! [`ScmRecipeFixture`] supplies typical `scm.yaml` contents.

use crate::constants::{ARTIFACT_DIR, BUILD_INFO_DIR, REDIRECT_FILE, SCM_INFO_DIR, VERSION_DIR};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Sample `scm.yaml` contents
#[derive(Clone, Debug)]
pub struct ScmRecipeFixture {
    pub content: String,
}

impl ScmRecipeFixture {
    /// Just a repository URI
    pub fn uri(uri: &str) -> Self {
        Self {
            content: format!("uri: {uri}\n"),
        }
    }

    /// A repository with one tag mapping
    pub fn with_mapping(uri: &str, pattern: &str, tag: &str) -> Self {
        Self {
            content: format!("uri: {uri}\ntagMapping:\n  - pattern: '{pattern}'\n    tag: '{tag}'\n"),
        }
    }

    /// A current repository plus one legacy repository
    pub fn with_legacy(uri: &str, legacy_uri: &str) -> Self {
        Self {
            content: format!("uri: {uri}\nlegacyRepos:\n  - uri: {legacy_uri}\n"),
        }
    }

    /// Not valid YAML for an scm recipe
    pub fn invalid() -> Self {
        Self {
            content: "uri: [unterminated\n".to_string(),
        }
    }
}

/// A recipe database rooted at a directory, usually a `TempDir`.
#[derive(Clone, Debug)]
pub struct RecipeTree {
    root: PathBuf,
}

impl RecipeTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a group, artifact override, version override or artifact +
    /// version override under `scm-info/`.
    pub fn level_dir(&self, group: &str, artifact: Option<&str>, version: Option<&str>) -> PathBuf {
        let mut dir = group.split('.').fold(self.root.join(SCM_INFO_DIR), |p, s| p.join(s));
        if let Some(artifact) = artifact {
            dir = dir.join(ARTIFACT_DIR).join(artifact);
        }
        if let Some(version) = version {
            dir = dir.join(VERSION_DIR).join(version);
        }
        dir
    }

    /// Writes `file_name` with `content` at a level and returns its path.
    pub fn recipe(
        &self,
        group: &str,
        artifact: Option<&str>,
        version: Option<&str>,
        file_name: &str,
        content: &str,
    ) -> Result<PathBuf> {
        write(&self.level_dir(group, artifact, version).join(file_name), content)
    }

    /// Writes `scm.yaml` at a level.
    pub fn scm(
        &self,
        group: &str,
        artifact: Option<&str>,
        version: Option<&str>,
        fixture: &ScmRecipeFixture,
    ) -> Result<PathBuf> {
        self.recipe(group, artifact, version, "scm.yaml", &fixture.content)
    }

    /// Writes a `redirect.yaml` marker at a level. `None` keys are omitted.
    pub fn redirect(
        &self,
        at: &Path,
        group_id: Option<&str>,
        artifact_id: Option<&str>,
        version: Option<&str>,
    ) -> Result<PathBuf> {
        let mut content = String::new();
        for (key, value) in [("group-id", group_id), ("artifact-id", artifact_id), ("version", version)] {
            if let Some(value) = value {
                content.push_str(&format!("{key}: \"{value}\"\n"));
            }
        }
        write(&at.join(REDIRECT_FILE), &content)
    }

    /// Writes `build-info/<normalized uri>/<file_name>`.
    pub fn build_info(&self, normalized_uri: &str, file_name: &str, content: &str) -> Result<PathBuf> {
        let dir = normalized_uri.split('/').fold(self.root.join(BUILD_INFO_DIR), |p, s| p.join(s));
        write(&dir.join(file_name), content)
    }
}

fn write(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}
