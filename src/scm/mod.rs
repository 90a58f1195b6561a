//! Tag discovery: from a coordinate to the tag and commit its release was built from.
//!
//! [`ScmTagResolver`] first finds the repositories a coordinate lives in, trying
//! each [`ScmStrategy`] in order until one yields an [`ScmInfo`]:
//!
//! - [`ScmStrategy::Recipe`] reads the `scm.yaml` recipe through a [`RecipeResolver`]
//! - [`ScmStrategy::PomDiscovery`] reads the released POM and its same-group parents
//!
//! It then lists the remote tags of every candidate repository (the primary one,
//! then the legacy ones) and runs [`select_tag`] against them. The first repository
//! with a match wins. When every candidate fails, the first failure is returned,
//! since the primary repository's error is usually the relevant one. Failures that
//! are not specific to one repository (see [`RecipeError::is_candidate_failure`])
//! end the search at once.

mod pom;
mod tags;
mod uri;

pub use pom::{HttpPomSource, Pom, PomParent, PomScm, PomSource, discover_scm, pom_url};
pub use tags::select_tag;
pub use uri::scm_to_https;

use crate::config::ResolverConfig;
use crate::core::{Coordinate, RecipeError, TagInfo};
use crate::recipe::{RepositoryInfo, ScmInfo, TagMapping};
use crate::resolver::RecipeResolver;
use anyhow::Result;
use dashmap::DashMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Lists the tags of a remote repository as tag name to commit hash.
pub trait TagSource: Send + Sync {
    fn list_tags(&self, uri: &str) -> impl Future<Output = Result<HashMap<String, String>>> + Send;
}

/// A [`TagSource`] backed by `git ls-remote --tags`.
#[derive(Debug, Clone, Default)]
pub struct GitTagSource {
    timeout: Option<Duration>,
}

impl GitTagSource {
    #[must_use]
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
        }
    }
}

impl TagSource for GitTagSource {
    async fn list_tags(&self, uri: &str) -> Result<HashMap<String, String>> {
        crate::git::list_remote_tags(uri, self.timeout).await
    }
}

/// Ways of finding the repositories of a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScmStrategy {
    /// The `scm.yaml` recipe for the coordinate
    Recipe,
    /// The `<scm>` block of the released POM or a same-group parent
    PomDiscovery,
}

impl ScmStrategy {
    pub const DEFAULT_ORDER: [Self; 2] = [Self::Recipe, Self::PomDiscovery];
}

/// Resolves coordinates to [`TagInfo`].
pub struct ScmTagResolver<T = GitTagSource, P = HttpPomSource> {
    recipes: Arc<RecipeResolver>,
    tag_source: T,
    pom_source: P,
    strategies: Vec<ScmStrategy>,
    /// Remote tag listings by URI, when caching is enabled
    tag_cache: Option<DashMap<String, Arc<HashMap<String, String>>>>,
}

impl ScmTagResolver {
    /// Builds a resolver that lists tags with git and fetches POMs from the
    /// configured artifact cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(recipes: Arc<RecipeResolver>, config: &ResolverConfig) -> Result<Self> {
        let poms = HttpPomSource::new(&config.cache_url, config.http_timeout())?;
        let tags = GitTagSource::new(Some(config.git_timeout()));
        Ok(Self::new(recipes, tags, poms).with_tag_cache(config.cache_repo_tags))
    }
}

impl<T: TagSource, P: PomSource> ScmTagResolver<T, P> {
    pub fn new(recipes: Arc<RecipeResolver>, tag_source: T, pom_source: P) -> Self {
        Self {
            recipes,
            tag_source,
            pom_source,
            strategies: ScmStrategy::DEFAULT_ORDER.to_vec(),
            tag_cache: None,
        }
    }

    /// Keeps remote tag listings for the lifetime of this resolver.
    #[must_use]
    pub fn with_tag_cache(mut self, enabled: bool) -> Self {
        self.tag_cache = enabled.then(DashMap::new);
        self
    }

    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<ScmStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    #[must_use]
    pub fn recipes(&self) -> &Arc<RecipeResolver> {
        &self.recipes
    }

    /// Finds the repositories of `coordinate`, trying each strategy in order.
    ///
    /// A recipe where every repository has an empty URI counts as not found.
    ///
    /// # Errors
    ///
    /// Returns an error if recipe resolution or POM retrieval fails.
    pub async fn discover(&self, coordinate: &Coordinate) -> Result<Option<(ScmStrategy, ScmInfo)>> {
        for strategy in &self.strategies {
            let found = match strategy {
                ScmStrategy::Recipe => {
                    self.recipes.resolve_scm_info(coordinate).await?.and_then(usable_repositories)
                }
                ScmStrategy::PomDiscovery => discover_scm(&self.pom_source, coordinate).await?.map(ScmInfo::new),
            };
            if let Some(info) = found {
                tracing::debug!("Found SCM info for {} via {:?}: {}", coordinate, strategy, info.uri());
                return Ok(Some((*strategy, info)));
            }
            tracing::debug!("No SCM info for {} via {:?}", coordinate, strategy);
        }
        Ok(None)
    }

    /// Determines the tag and commit `coordinate` was released from.
    ///
    /// # Errors
    ///
    /// - [`RecipeError::ScmNotFound`] when no strategy finds a repository
    /// - the first candidate repository's failure when no repository has a matching tag
    /// - at once, any failure that is not specific to one repository
    pub async fn resolve_tag_info(&self, coordinate: &Coordinate) -> Result<TagInfo> {
        let Some((_, info)) = self.discover(coordinate).await? else {
            return Err(RecipeError::ScmNotFound {
                coordinate: coordinate.to_string(),
            }
            .into());
        };

        let mappings = info.all_tag_mappings();
        let mut first_failure = None;
        for repo in info.repositories().filter(|r| has_uri(r)) {
            match self.resolve_in_repository(coordinate, repo, &mappings).await {
                Ok(found) => return Ok(found),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    tracing::error!("Failed to find tag for {} in {}: {:#}", coordinate, repo.uri, e);
                    first_failure.get_or_insert(e);
                }
            }
        }

        Err(first_failure.unwrap_or_else(|| {
            RecipeError::ScmNotFound {
                coordinate: coordinate.to_string(),
            }
            .into()
        }))
    }

    async fn resolve_in_repository(
        &self,
        coordinate: &Coordinate,
        repo: &RepositoryInfo,
        mappings: &[TagMapping],
    ) -> Result<TagInfo> {
        let tags = self.remote_tags(&repo.uri).await?;
        let tag = select_tag(&coordinate.version, mappings, &tags)?;
        tracing::info!("Selected tag {} in {} for {}", tag, repo.uri, coordinate);
        Ok(TagInfo {
            repo: repo.clone(),
            hash: tags.get(&tag).cloned(),
            tag,
        })
    }

    async fn remote_tags(&self, uri: &str) -> Result<Arc<HashMap<String, String>>> {
        let Some(cache) = &self.tag_cache else {
            return Ok(Arc::new(self.tag_source.list_tags(uri).await?));
        };
        if let Some(hit) = cache.get(uri) {
            tracing::trace!("Tag cache hit for {}", uri);
            return Ok(Arc::clone(hit.value()));
        }

        let tags = Arc::new(self.tag_source.list_tags(uri).await?);
        Ok(Arc::clone(cache.entry(uri.to_string()).or_insert(tags).value()))
    }
}

/// A typed failure that no other candidate repository can avoid, such as git
/// missing from `PATH`.
fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<RecipeError>())
        .is_some_and(|e| !e.is_candidate_failure())
}

fn has_uri(repo: &RepositoryInfo) -> bool {
    !repo.uri.trim().is_empty()
}

fn usable_repositories(info: ScmInfo) -> Option<ScmInfo> {
    let usable = info.repositories().any(has_uri);
    usable.then_some(info)
}

#[cfg(test)]
mod tests;
