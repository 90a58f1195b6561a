use super::{Recipe, RecipeKind};
use serde::{Deserialize, Serialize};

fn default_scm_type() -> String {
    "git".to_string()
}

fn is_git(scm_type: &str) -> bool {
    scm_type == "git"
}

/// Maps versions matching `pattern` onto a tag name.
///
/// `tag` may reference capture groups of `pattern` as `$0`, `$1`, ... A `tag` with
/// no `$` at all is an explicit reference (tag, branch or commit) and is used even
/// when it does not appear in the remote tag listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagMapping {
    /// Regular expression that must match the whole version string
    pub pattern: String,
    /// Tag template
    pub tag: String,
}

impl TagMapping {
    #[must_use]
    pub fn new(pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            tag: tag.into(),
        }
    }
}

/// One source repository: where the code lives and how versions map to tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    /// VCS type, `git` unless stated otherwise
    #[serde(rename = "type", default = "default_scm_type", skip_serializing_if = "is_git")]
    pub scm_type: String,

    /// Canonical clone URI
    #[serde(default)]
    pub uri: String,

    /// Sub-directory of the repository that holds the build, if not the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Whether the repository requires credentials
    #[serde(rename = "private", default, skip_serializing_if = "std::ops::Not::not")]
    pub private_repo: bool,

    /// Explicit version to tag rules, tried in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_mapping: Vec<TagMapping>,
}

impl Default for RepositoryInfo {
    fn default() -> Self {
        Self {
            scm_type: default_scm_type(),
            uri: String::new(),
            path: None,
            private_repo: false,
            tag_mapping: Vec::new(),
        }
    }
}

impl RepositoryInfo {
    /// A git repository at `uri` with no tag mappings.
    #[must_use]
    pub fn git(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Contents of an `scm.yaml` recipe: the primary repository plus any repositories the
/// project lived in previously.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmInfo {
    /// The current repository
    #[serde(flatten)]
    pub repository: RepositoryInfo,

    /// Older repositories, tried in order after the primary one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_repos: Vec<RepositoryInfo>,
}

impl ScmInfo {
    /// A git-backed recipe for `uri` with no legacy repositories.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            repository: RepositoryInfo::git(uri),
            legacy_repos: Vec::new(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.repository.uri
    }

    /// Candidate repositories in the order they should be tried: the primary first,
    /// then each legacy repository.
    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryInfo> {
        std::iter::once(&self.repository).chain(self.legacy_repos.iter())
    }

    /// Every tag mapping across all repositories, primary mappings first.
    #[must_use]
    pub fn all_tag_mappings(&self) -> Vec<TagMapping> {
        self.repositories().flat_map(|r| r.tag_mapping.iter().cloned()).collect()
    }
}

impl Recipe for ScmInfo {
    fn kind() -> RecipeKind {
        RecipeKind::SCM
    }
}
