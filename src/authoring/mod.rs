//! Editing `scm.yaml` recipes in a local recipe database.
//!
//! [`add_scm`] creates or updates the recipe for a coordinate at the scope the
//! caller asks for. With [`AddScmRequest::legacy`] it instead appends a legacy
//! repository to the recipe that currently applies to the coordinate.

use crate::core::Coordinate;
use crate::recipe::{Recipe, RepositoryInfo, ScmInfo, TagMapping, read_recipe, write_recipe_file};
use crate::store::RecipeLayout;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

/// What to write and where.
///
/// The scope is derived from two flags: `group_scoped` drops the artifact level
/// and `version_scoped` adds the version level. The default writes an artifact
/// override.
#[derive(Debug, Clone)]
pub struct AddScmRequest {
    pub coordinate: Coordinate,
    pub uri: Option<String>,
    /// Sub-directory of the repository. `/` clears an existing path.
    pub path: Option<String>,
    pub group_scoped: bool,
    pub version_scoped: bool,
    pub legacy: bool,
    pub tag_mappings: Vec<TagMapping>,
}

impl AddScmRequest {
    #[must_use]
    pub const fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            uri: None,
            path: None,
            group_scoped: false,
            version_scoped: false,
            legacy: false,
            tag_mappings: Vec::new(),
        }
    }

    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn group_scoped(mut self, enabled: bool) -> Self {
        self.group_scoped = enabled;
        self
    }

    #[must_use]
    pub const fn version_scoped(mut self, enabled: bool) -> Self {
        self.version_scoped = enabled;
        self
    }

    #[must_use]
    pub const fn legacy(mut self, enabled: bool) -> Self {
        self.legacy = enabled;
        self
    }

    #[must_use]
    pub fn tag_mapping(mut self, mapping: TagMapping) -> Self {
        self.tag_mappings.push(mapping);
        self
    }
}

/// Existing `scm.yaml` files that apply to `coordinate`, most specific first.
///
/// # Errors
///
/// Returns an error on a redirect cycle.
pub fn lookup_scm_locations(layout: &RecipeLayout, coordinate: &Coordinate) -> Result<Vec<PathBuf>> {
    let Some(found) = layout.resolve_locations(coordinate)? else {
        return Ok(Vec::new());
    };
    let kind = ScmInfo::kind();
    Ok(found
        .override_tiers()
        .chain(std::iter::once(found.group.as_path()))
        .map(|dir| dir.join(kind.file_name()))
        .filter(|file| file.is_file())
        .collect())
}

/// Creates or updates an `scm.yaml` recipe. Returns the path written.
///
/// Without `legacy`, the most specific existing recipe is updated in place when no
/// new URI is given; otherwise the recipe is written at the requested scope,
/// starting from the existing recipe's contents if there is one.
///
/// # Errors
///
/// Fails when there is neither a URI nor an existing recipe, when `legacy` is set
/// without an existing recipe or URI, or when the file cannot be written.
pub fn add_scm(layout: &RecipeLayout, request: &AddScmRequest) -> Result<PathBuf> {
    let existing = lookup_scm_locations(layout, &request.coordinate)?;
    if request.legacy {
        return add_legacy_repository(&existing, request);
    }

    let (mut info, existing_file) = match existing.first() {
        Some(file) => {
            let info: ScmInfo = read_recipe(file)?;
            if request.uri.as_deref() == Some(info.uri()) {
                tracing::warn!("Provided URI matches the existing URI in {}", file.display());
            }
            (info, Some(file.clone()))
        }
        None => {
            let Some(uri) = &request.uri else {
                bail!("No URI given and no existing SCM recipe for {}", request.coordinate);
            };
            (ScmInfo::new(uri.clone()), None)
        }
    };

    if let Some(uri) = &request.uri {
        info.repository.uri.clone_from(uri);
    }
    if let Some(path) = &request.path {
        info.repository.path = (path != "/").then(|| path.clone());
    }
    info.repository.tag_mapping.extend(request.tag_mappings.iter().cloned());

    match existing_file {
        Some(file) if request.uri.is_none() => {
            write_recipe_file(&file, &info)?;
            tracing::info!("Updated {}", file.display());
            Ok(file)
        }
        _ => {
            let c = &request.coordinate;
            let artifact = (!request.group_scoped).then_some(c.artifact_id.as_str());
            let version = request.version_scoped.then_some(c.version.as_str());
            layout.write_recipe(&c.group_id, artifact, version, &info)
        }
    }
}

fn add_legacy_repository(existing: &[PathBuf], request: &AddScmRequest) -> Result<PathBuf> {
    let Some(file) = existing.first() else {
        bail!("Cannot add a legacy repository: no existing SCM recipe for {}", request.coordinate);
    };
    let Some(uri) = &request.uri else {
        bail!("A URI is required to add a legacy repository");
    };

    let mut info: ScmInfo = read_recipe(file)?;
    let index = match info.legacy_repos.iter().position(|r| &r.uri == uri) {
        Some(index) => index,
        None => {
            let mut repo = RepositoryInfo::git(uri.clone());
            repo.path.clone_from(&request.path);
            info.legacy_repos.push(repo);
            info.legacy_repos.len() - 1
        }
    };
    info.legacy_repos[index].tag_mapping.extend(request.tag_mappings.iter().cloned());

    write_recipe_file(file, &info).with_context(|| format!("Failed to update {}", file.display()))?;
    tracing::info!("Added legacy repository {} to {}", uri, file.display());
    Ok(file.clone())
}
