//! Multi-source recipe resolution.
//!
//! [`RecipeResolver`] combines an ordered list of [`RecipeDirectory`] sources,
//! highest priority first, and answers "which file holds recipe kind K for
//! coordinate C". Specificity beats priority:
//!
//! 1. artifact + version override
//! 2. version override
//! 3. artifact override
//! 4. group level
//!
//! Within a tier, the first source that has the file wins. A lower priority source
//! with a version override therefore beats a higher priority source that only has a
//! group-level recipe.
//!
//! # Group cache
//!
//! When at least one source knows a group and none has any override directory for
//! it, the group-level answer holds for every coordinate in that group, so it is cached by group id and later
//! coordinates skip the directory walk. The cache lives as long as the resolver and
//! is never invalidated: one resolver is one resolution session. Create a new
//! resolver to observe recipes added after the first lookup of a group.
//!
//! # Examples
//!
//! ```rust,no_run
//! use recipedb_cli::core::Coordinate;
//! use recipedb_cli::recipe::RecipeKind;
//! use recipedb_cli::resolver::RecipeResolver;
//! use recipedb_cli::store::RecipeLayout;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolver = RecipeResolver::new(vec![Arc::new(RecipeLayout::open("/srv/recipes"))]);
//! let coordinate = Coordinate::parse("io.quarkus:quarkus-core:2.2.0.Final")?;
//! let found = resolver.resolve(&[coordinate.clone()], &[RecipeKind::SCM]).await?;
//! if let Some(path) = found[&coordinate].get(&RecipeKind::SCM) {
//!     println!("scm recipe at {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```


use crate::config::ResolverConfig;
use crate::core::Coordinate;
use crate::recipe::{BuildRecipeInfo, Recipe, RecipeKind, ScmInfo, read_recipe};
use crate::store::{PathMatch, RecipeDirectory, RecipeLayout, RecipeRepository};
use anyhow::{Context, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Recipe files found for one coordinate, by kind. Kinds with no file are absent.
pub type RecipeLocations = HashMap<RecipeKind, PathBuf>;

/// Group-level results for an authoritative group. `None` records a kind that was
/// looked up and not found.
type GroupEntry = HashMap<RecipeKind, Option<PathBuf>>;

/// Resolves recipe files across prioritized sources.
#[derive(Debug)]
pub struct RecipeResolver {
    sources: Vec<Arc<dyn RecipeDirectory>>,
    group_cache: DashMap<String, GroupEntry>,
    /// Owns the temporary checkout directory when one was created
    _checkouts: Option<TempDir>,
}

impl RecipeResolver {
    /// Creates a resolver over `sources`, highest priority first.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn RecipeDirectory>>) -> Self {
        Self {
            sources,
            group_cache: DashMap::new(),
            _checkouts: None,
        }
    }

    /// Opens every source named by `config`: local directories first, then each
    /// recipe repository cloned into the checkout directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a repository cannot be cloned.
    pub async fn from_config(config: &ResolverConfig) -> Result<Self> {
        let mut sources: Vec<Arc<dyn RecipeDirectory>> = config
            .local_recipe_dirs
            .iter()
            .map(|dir| Arc::new(RecipeLayout::open(dir)) as Arc<dyn RecipeDirectory>)
            .collect();

        let mut temp = None;
        if !config.recipe_repos.is_empty() {
            crate::git::ensure_git_available()?;
            let checkout_root = if let Some(dir) = &config.checkout_dir {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create checkout directory {}", dir.display()))?;
                dir.clone()
            } else {
                let dir = TempDir::with_prefix("recipedb-").context("Failed to create checkout directory")?;
                let path = dir.path().to_path_buf();
                temp = Some(dir);
                path
            };

            for (index, reference) in config.recipe_repos.iter().enumerate() {
                let target = checkout_root.join(checkout_name(index, reference));
                let source = if crate::git::is_valid_git_repo(&target) {
                    let (remote, branch) = crate::git::split_branch(reference);
                    tracing::debug!("Reusing recipe checkout {}", target.display());
                    RecipeRepository::from_checkout(
                        remote,
                        branch,
                        crate::git::GitRepo::new(&target),
                        config.update_interval(),
                        Some(config.git_timeout()),
                    )
                } else {
                    RecipeRepository::clone(
                        reference,
                        &target,
                        config.update_interval(),
                        Some(config.git_timeout()),
                    )
                    .await?
                };
                sources.push(Arc::new(source));
            }
        }

        Ok(Self {
            sources,
            group_cache: DashMap::new(),
            _checkouts: temp,
        })
    }

    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn RecipeDirectory>] {
        &self.sources
    }

    /// Refreshes every source that needs it.
    ///
    /// # Errors
    ///
    /// Returns the first refresh failure.
    pub async fn refresh(&self) -> Result<()> {
        futures::future::try_join_all(self.sources.iter().map(|s| s.refresh())).await?;
        Ok(())
    }

    /// Resolves `kinds` for every coordinate.
    ///
    /// Every requested coordinate appears in the result, with an empty map when
    /// nothing was found.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be refreshed or a redirect cycle is found.
    pub async fn resolve(
        &self,
        coordinates: &[Coordinate],
        kinds: &[RecipeKind],
    ) -> Result<HashMap<Coordinate, RecipeLocations>> {
        self.refresh().await?;
        let mut results = HashMap::with_capacity(coordinates.len());
        for coordinate in coordinates {
            let locations = self.resolve_coordinate(coordinate, kinds)?;
            results.insert(coordinate.clone(), locations);
        }
        Ok(results)
    }

    /// Resolves `kinds` for one coordinate against the current state of the sources,
    /// without refreshing them.
    ///
    /// # Errors
    ///
    /// Returns an error on a redirect cycle.
    pub fn resolve_coordinate(&self, coordinate: &Coordinate, kinds: &[RecipeKind]) -> Result<RecipeLocations> {
        if let Some(cached) = self.cached(&coordinate.group_id, kinds) {
            tracing::trace!("Group cache hit for {}", coordinate);
            return Ok(cached);
        }

        let mut matches = Vec::new();
        for source in &self.sources {
            let found = source
                .resolve_locations(coordinate)
                .with_context(|| format!("Failed to look up {} in {}", coordinate, source.describe()))?;
            if let Some(m) = found {
                matches.push(m);
            }
        }

        let mut cacheable = !matches.is_empty() && matches.iter().all(|m| m.group_authoritative);
        let mut results = RecipeLocations::new();
        let mut authoritative = GroupEntry::new();

        for kind in kinds {
            if let Some(path) = find_override(&matches, kind) {
                tracing::debug!("{} {} recipe from override {}", coordinate, kind, path.display());
                cacheable = false;
                results.insert(kind.clone(), path);
                continue;
            }

            let group_hit = matches.iter().find_map(|m| {
                let path = m.group.join(kind.file_name());
                path.is_file().then_some((path, m.group_authoritative))
            });
            match group_hit {
                Some((path, is_authoritative)) => {
                    tracing::debug!("{} {} recipe from group {}", coordinate, kind, path.display());
                    if is_authoritative {
                        authoritative.insert(kind.clone(), Some(path.clone()));
                    } else {
                        cacheable = false;
                    }
                    results.insert(kind.clone(), path);
                }
                None => {
                    tracing::debug!("No {} recipe for {}", kind, coordinate);
                    authoritative.insert(kind.clone(), None);
                }
            }
        }

        if cacheable {
            self.group_cache
                .entry(coordinate.group_id.clone())
                .and_modify(|cached| {
                    for (kind, path) in &authoritative {
                        cached.entry(kind.clone()).or_insert_with(|| path.clone());
                    }
                })
                .or_insert(authoritative);
        }

        Ok(results)
    }

    fn cached(&self, group_id: &str, kinds: &[RecipeKind]) -> Option<RecipeLocations> {
        let entry = self.group_cache.get(group_id)?;
        if !kinds.iter().all(|k| entry.contains_key(k)) {
            return None;
        }
        Some(
            kinds
                .iter()
                .filter_map(|k| entry.get(k).cloned().flatten().map(|p| (k.clone(), p)))
                .collect(),
        )
    }

    /// Finds build recipes for a source repository. The first source with a file
    /// for a kind wins; there are no specificity tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be refreshed.
    pub async fn resolve_build_info(&self, scm_uri: &str, kinds: &[RecipeKind]) -> Result<RecipeLocations> {
        self.refresh().await?;
        let normalized = normalize_scm_uri(scm_uri);

        let mut dirs = Vec::new();
        for source in &self.sources {
            if let Some(dir) = source.resolve_build_location(&normalized)? {
                dirs.push(dir);
            }
        }

        let mut results = RecipeLocations::new();
        for kind in kinds {
            if let Some(path) = dirs.iter().map(|d| d.join(kind.file_name())).find(|p| p.is_file()) {
                results.insert(kind.clone(), path);
            }
        }
        Ok(results)
    }

    /// Reads the `scm.yaml` recipe for a coordinate.
    ///
    /// An unreadable recipe is logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution itself fails.
    pub async fn resolve_scm_info(&self, coordinate: &Coordinate) -> Result<Option<ScmInfo>> {
        let mut found = self.resolve(std::slice::from_ref(coordinate), &[RecipeKind::SCM]).await?;
        let path = found.remove(coordinate).and_then(|mut kinds| kinds.remove(&RecipeKind::SCM));
        Ok(path.and_then(|p| read_soft(&p)))
    }

    /// Reads the `build.yaml` recipe for a source repository.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution itself fails.
    pub async fn resolve_build_recipe(&self, scm_uri: &str) -> Result<Option<BuildRecipeInfo>> {
        let mut found = self.resolve_build_info(scm_uri, &[BuildRecipeInfo::kind()]).await?;
        Ok(found.remove(&RecipeKind::BUILD).and_then(|p| read_soft(&p)))
    }
}

fn read_soft<R: Recipe>(path: &Path) -> Option<R> {
    match read_recipe(path) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
            tracing::warn!("Ignoring unreadable {} recipe {}: {:#}", R::kind(), path.display(), e);
            None
        }
    }
}

/// Searches override tiers, most specific first, across sources in priority order.
fn find_override(matches: &[PathMatch], kind: &RecipeKind) -> Option<PathBuf> {
    let tiers: [fn(&PathMatch) -> Option<&PathBuf>; 3] = [
        |m| m.artifact_and_version.as_ref(),
        |m| m.version.as_ref(),
        |m| m.artifact.as_ref(),
    ];
    tiers.iter().find_map(|tier| {
        matches
            .iter()
            .filter(|m| !m.group_authoritative)
            .filter_map(*tier)
            .map(|dir| dir.join(kind.file_name()))
            .find(|p| p.is_file())
    })
}

/// Normalizes an SCM URI into a build-info key: drops a trailing `.git` and
/// everything up to and including `://`.
///
/// ```rust
/// use recipedb_cli::resolver::normalize_scm_uri;
///
/// assert_eq!(normalize_scm_uri("https://github.com/quarkusio/quarkus.git"), "github.com/quarkusio/quarkus");
/// ```
#[must_use]
pub fn normalize_scm_uri(scm_uri: &str) -> String {
    let trimmed = scm_uri.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let without_scheme = trimmed.find("://").map_or(trimmed, |pos| &trimmed[pos + 3..]);
    without_scheme.to_string()
}

/// Directory name for the `index`th recipe repository checkout.
fn checkout_name(index: usize, reference: &str) -> String {
    let (url, branch) = crate::git::split_branch(reference);
    let slug: String = normalize_scm_uri(url)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    format!("{index}-{slug}-{branch}")
}
