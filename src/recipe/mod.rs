//! Recipe kinds, typed recipe payloads and the YAML codec used to store them.
//!
//! A *recipe* is one named piece of build metadata stored as a YAML file inside a
//! recipe store. Which file a recipe lives in is determined by its [`RecipeKind`];
//! the set of kinds is open, so new kinds can be introduced without touching the
//! store or the resolver:
//!
//! ```rust
//! use recipedb_cli::recipe::RecipeKind;
//!
//! let scm = RecipeKind::SCM;
//! assert_eq!(scm.file_name(), "scm.yaml");
//!
//! let custom = RecipeKind::new("sbom", "sbom.yaml");
//! assert_eq!(custom.name(), "sbom");
//! ```
//!
//! Typed payloads implement [`Recipe`], which ties the Rust type to its kind so
//! that [`read_recipe`] and the store's `write_recipe` know which file to use.
//!
//! # Empty files
//!
//! An empty (or comment-only) recipe file decodes to the payload's `Default`
//! value rather than failing. Recipe authors use empty files as placeholders.

mod build;
mod scm;

pub use build::BuildRecipeInfo;
pub use scm::{RepositoryInfo, ScmInfo, TagMapping};

use crate::core::RecipeError;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// Names a recipe file. Two kinds are equal when both name and file name match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipeKind {
    name: Cow<'static, str>,
    file_name: Cow<'static, str>,
}

impl RecipeKind {
    /// Source location metadata (`scm.yaml`), decoded as [`ScmInfo`].
    pub const SCM: Self = Self::from_static("scm", "scm.yaml");

    /// Build instructions (`build.yaml`), decoded as [`BuildRecipeInfo`].
    pub const BUILD: Self = Self::from_static("build", "build.yaml");

    /// Creates a kind from static strings, usable in `const` context.
    #[must_use]
    pub const fn from_static(name: &'static str, file_name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            file_name: Cow::Borrowed(file_name),
        }
    }

    /// Creates a new kind at runtime.
    #[must_use]
    pub fn new(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            file_name: Cow::Owned(file_name.into()),
        }
    }

    /// Resolves a kind by name, returning a built-in kind when one matches and
    /// otherwise a kind stored in `<name>.yaml`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "scm" => Self::SCM,
            "build" => Self::BUILD,
            other => Self::new(other, format!("{other}.yaml")),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name this recipe is stored under in every directory tier.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A typed recipe payload stored in a file named by its [`RecipeKind`].
pub trait Recipe: Serialize + DeserializeOwned + Default {
    /// The kind (and therefore file name) this payload is stored under.
    fn kind() -> RecipeKind;
}

/// Decodes recipe YAML, mapping empty or comment-only content to `T::default()`.
///
/// # Errors
///
/// Returns the YAML decoder error for malformed content.
pub fn parse_recipe<T: DeserializeOwned + Default>(content: &str) -> Result<T, serde_yaml::Error> {
    let has_data = content.lines().map(str::trim).any(|line| {
        !line.is_empty() && !line.starts_with('#') && line != "---" && line != "~" && line != "null"
    });
    if !has_data {
        return Ok(T::default());
    }
    serde_yaml::from_str(content)
}

/// Reads and decodes a recipe file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or a [`RecipeError::RecipeParseError`]
/// if it is not valid YAML for `T`.
pub fn read_recipe<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipe file {}", path.display()))?;
    parse_recipe(&content).map_err(|e| {
        RecipeError::RecipeParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Encodes a recipe payload as YAML.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn encode_recipe<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| RecipeError::YamlError(e).into())
}

/// Encodes `value` and writes it to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error if encoding fails or the file cannot be written.
pub fn write_recipe_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = encode_recipe(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write recipe file {}", path.display()))
}
