use super::{PathMatch, RecipeDirectory};
use crate::constants::{
    ARTIFACT_DIR, BUILD_INFO_DIR, LEGACY_SCM_INFO_DIR, REDIRECT_FILE, SCM_INFO_DIR, VERSION_DIR,
};
use crate::core::{Coordinate, RecipeError};
use crate::recipe::{Recipe, read_recipe, write_recipe_file};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of a `redirect.yaml` marker. Every key is optional; missing keys keep
/// the value of the coordinate being resolved.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Redirect {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
}

impl Redirect {
    /// The coordinate this marker points at, or `None` if it names nothing or
    /// names a path outside the store.
    fn target(self, from: &Coordinate) -> Option<Coordinate> {
        if self.group_id.is_none() && self.artifact_id.is_none() && self.version.is_none() {
            return None;
        }
        let target = Coordinate {
            group_id: self.group_id.unwrap_or_else(|| from.group_id.clone()),
            artifact_id: self.artifact_id.unwrap_or_else(|| from.artifact_id.clone()),
            version: self.version.unwrap_or_else(|| from.version.clone()),
        };
        target.is_path_safe().then_some(target)
    }
}

/// Every candidate directory for a coordinate after redirects, existing or not.
struct Candidates {
    group: PathBuf,
    artifact: PathBuf,
    version: PathBuf,
    artifact_and_version: PathBuf,
}

impl Candidates {
    fn into_match(self) -> PathMatch {
        let group_authoritative =
            !self.group.join(ARTIFACT_DIR).exists() && !self.group.join(VERSION_DIR).exists();
        PathMatch {
            artifact: self.artifact.is_dir().then_some(self.artifact),
            version: self.version.is_dir().then_some(self.version),
            artifact_and_version: self
                .artifact_and_version
                .is_dir()
                .then_some(self.artifact_and_version),
            group: self.group,
            group_authoritative,
        }
    }
}

/// A recipe database on the local filesystem.
#[derive(Debug, Clone)]
pub struct RecipeLayout {
    scm_root: PathBuf,
    build_root: PathBuf,
}

impl RecipeLayout {
    /// Uses explicit roots for coordinate-keyed and repository-keyed recipes.
    pub fn new(scm_root: impl Into<PathBuf>, build_root: impl Into<PathBuf>) -> Self {
        Self {
            scm_root: scm_root.into(),
            build_root: build_root.into(),
        }
    }

    /// Opens a database root containing `scm-info/` (or legacy `recipes/`) and
    /// `build-info/`. Neither directory has to exist yet.
    pub fn open(database_root: impl AsRef<Path>) -> Self {
        let root = database_root.as_ref();
        let scm_root = root.join(SCM_INFO_DIR);
        let legacy = root.join(LEGACY_SCM_INFO_DIR);
        let scm_root = if !scm_root.exists() && legacy.is_dir() {
            tracing::debug!("Using legacy recipe directory {}", legacy.display());
            legacy
        } else {
            scm_root
        };
        Self::new(scm_root, root.join(BUILD_INFO_DIR))
    }

    #[must_use]
    pub fn scm_root(&self) -> &Path {
        &self.scm_root
    }

    #[must_use]
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    fn group_dir(&self, group_id: &str) -> PathBuf {
        group_id
            .split('.')
            .filter(|s| !s.is_empty() && *s != "..")
            .fold(self.scm_root.clone(), |p, s| p.join(s))
    }

    fn ensure_path_safe(coordinate: &Coordinate) -> Result<()> {
        if coordinate.is_path_safe() {
            return Ok(());
        }
        Err(RecipeError::InvalidCoordinate {
            input: coordinate.to_string(),
        }
        .into())
    }

    /// Resolves the recipe directories for `coordinate`, following redirects.
    ///
    /// Returns `None` when the group directory does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::InvalidCoordinate`] when a part of `coordinate` would
    /// name a directory outside the store, and [`RecipeError::RedirectCycle`] when a
    /// redirect chain revisits a directory. Malformed, dangling or escaping redirect
    /// markers are logged and ignored.
    pub fn resolve_locations(&self, coordinate: &Coordinate) -> Result<Option<PathMatch>> {
        Self::ensure_path_safe(coordinate)?;
        let mut chain = Vec::new();
        Ok(self.candidates(coordinate, &mut chain)?.map(Candidates::into_match))
    }

    fn candidates(&self, coordinate: &Coordinate, chain: &mut Vec<PathBuf>) -> Result<Option<Candidates>> {
        let group = self.follow_redirect(self.group_dir(&coordinate.group_id), coordinate, chain, |c| c.group)?;
        let artifact = self.follow_redirect(
            group.join(ARTIFACT_DIR).join(&coordinate.artifact_id),
            coordinate,
            chain,
            |c| c.artifact,
        )?;
        let version = self.follow_redirect(
            group.join(VERSION_DIR).join(&coordinate.version),
            coordinate,
            chain,
            |c| c.version,
        )?;
        let artifact_and_version = self.follow_redirect(
            artifact.join(VERSION_DIR).join(&coordinate.version),
            coordinate,
            chain,
            |c| c.artifact_and_version,
        )?;

        if !group.is_dir() {
            return Ok(None);
        }
        Ok(Some(Candidates {
            group,
            artifact,
            version,
            artifact_and_version,
        }))
    }

    /// Applies a `redirect.yaml` in `original`, if any, returning the directory to
    /// use in its place. `chain` holds the directories whose redirects are currently
    /// being followed.
    fn follow_redirect(
        &self,
        original: PathBuf,
        coordinate: &Coordinate,
        chain: &mut Vec<PathBuf>,
        pick: fn(Candidates) -> PathBuf,
    ) -> Result<PathBuf> {
        let marker = original.join(REDIRECT_FILE);
        if !marker.is_file() {
            return Ok(original);
        }
        if chain.contains(&original) {
            let mut visited: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
            visited.push(original.display().to_string());
            return Err(RecipeError::RedirectCycle {
                chain: visited.join(" -> "),
            }
            .into());
        }

        let redirect: Redirect = match read_recipe(&marker) {
            Ok(redirect) => redirect,
            Err(e) => {
                tracing::warn!("Ignoring unreadable redirect {}: {:#}", marker.display(), e);
                return Ok(original);
            }
        };
        let Some(target) = redirect.target(coordinate) else {
            tracing::warn!("Ignoring redirect {} that names no usable target", marker.display());
            return Ok(original);
        };

        chain.push(original.clone());
        let resolved = self.candidates(&target, chain);
        chain.pop();

        match resolved? {
            Some(candidates) => {
                let redirected = pick(candidates);
                tracing::debug!("Redirected {} to {} ({})", original.display(), redirected.display(), target);
                Ok(redirected)
            }
            None => {
                tracing::warn!("Redirect in {} did not resolve to a directory", marker.display());
                Ok(original)
            }
        }
    }

    /// Writes `recipe` at the level named by `group_id` and the optional artifact
    /// and version, following redirects the same way lookups do. Missing
    /// directories are created. Returns the path of the written file.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::InvalidCoordinate`] when a level would lie outside the
    /// store, and an error on a redirect cycle or if the file cannot be written.
    pub fn write_recipe<R: Recipe>(
        &self,
        group_id: &str,
        artifact_id: Option<&str>,
        version: Option<&str>,
        recipe: &R,
    ) -> Result<PathBuf> {
        let coordinate =
            Coordinate::new(group_id, artifact_id.unwrap_or_default(), version.unwrap_or_default());
        Self::ensure_path_safe(&coordinate)?;
        let mut chain = Vec::new();

        let mut dir = self.follow_redirect(self.group_dir(group_id), &coordinate, &mut chain, |c| c.group)?;
        if let Some(artifact_id) = artifact_id {
            dir = self.follow_redirect(
                dir.join(ARTIFACT_DIR).join(artifact_id),
                &coordinate,
                &mut chain,
                |c| c.artifact,
            )?;
        }
        if let Some(version) = version {
            let pick: fn(Candidates) -> PathBuf = if artifact_id.is_some() {
                |c: Candidates| c.artifact_and_version
            } else {
                |c: Candidates| c.version
            };
            dir = self.follow_redirect(dir.join(VERSION_DIR).join(version), &coordinate, &mut chain, pick)?;
        }

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create recipe directory {}", dir.display()))?;
        let file = dir.join(R::kind().file_name());
        write_recipe_file(&file, recipe)?;
        tracing::info!("Wrote {} recipe to {}", R::kind(), file.display());
        Ok(file)
    }

    /// Resolves `build-info/<normalized uri>` if that directory exists.
    pub fn resolve_build_location(&self, normalized_scm_uri: &str) -> Option<PathBuf> {
        let dir = normalized_scm_uri
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .fold(self.build_root.clone(), |p, s| p.join(s));
        (dir != self.build_root && dir.is_dir()).then_some(dir)
    }
}

impl RecipeDirectory for RecipeLayout {
    fn resolve_locations(&self, coordinate: &Coordinate) -> Result<Option<PathMatch>> {
        Self::resolve_locations(self, coordinate)
    }

    fn resolve_build_location(&self, normalized_scm_uri: &str) -> Result<Option<PathBuf>> {
        Ok(Self::resolve_build_location(self, normalized_scm_uri))
    }

    fn describe(&self) -> String {
        self.scm_root.display().to_string()
    }
}
