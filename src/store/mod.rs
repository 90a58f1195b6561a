//! Recipe stores: directory trees of per-coordinate build metadata.
//!
//! A recipe database root contains two trees:
//!
//! ```text
//! scm-info/io/quarkus/scm.yaml                                  group level
//! scm-info/io/quarkus/_artifact/quarkus-core/scm.yaml           artifact level
//! scm-info/io/quarkus/_version/2.2.0-rhosk3/scm.yaml            version level
//! scm-info/io/quarkus/_artifact/quarkus-core/_version/2.2.0/    artifact + version level
//! build-info/github.com/quarkusio/quarkus/build.yaml            keyed by repository
//! ```
//!
//! Any level may contain a `redirect.yaml` marker that re-points it at another
//! coordinate. Older databases use `recipes/` instead of `scm-info/`.
//!
//! [`RecipeLayout`] answers lookups against one such tree on disk;
//! [`RecipeRepository`] wraps a layout that lives in a git checkout and keeps it
//! up to date. Both implement [`RecipeDirectory`], the interface the
//! [`RecipeResolver`](crate::resolver::RecipeResolver) aggregates.

mod layout;
mod repository;

pub use layout::RecipeLayout;
pub use repository::RecipeRepository;

use crate::core::Coordinate;
use anyhow::Result;
use futures::future::BoxFuture;
use std::fmt;
use std::path::{Path, PathBuf};

/// The directories that may hold recipes for one coordinate in one store.
///
/// `group` always exists. The other levels are present only when their directory
/// exists, after redirects have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub group: PathBuf,
    pub artifact: Option<PathBuf>,
    pub version: Option<PathBuf>,
    pub artifact_and_version: Option<PathBuf>,
    /// True when the group has neither an `_artifact` nor a `_version` directory,
    /// so the group-level answer holds for every coordinate in the group.
    pub group_authoritative: bool,
}

impl PathMatch {
    /// Override directories, most specific first: artifact + version, version,
    /// then artifact.
    pub fn override_tiers(&self) -> impl Iterator<Item = &Path> {
        [&self.artifact_and_version, &self.version, &self.artifact]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }
}

/// A single source of recipes, as seen by the resolver.
///
/// Lookups are synchronous filesystem checks. [`refresh`](Self::refresh) is called
/// by the resolver before each batch and may perform network I/O.
pub trait RecipeDirectory: Send + Sync + fmt::Debug {
    /// Resolves the recipe directories for `coordinate`, or `None` when the group
    /// is unknown to this store.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::RedirectCycle`](crate::core::RecipeError::RedirectCycle)
    /// if redirect markers form a loop.
    fn resolve_locations(&self, coordinate: &Coordinate) -> Result<Option<PathMatch>>;

    /// Resolves the build-info directory for a normalized SCM URI such as
    /// `github.com/quarkusio/quarkus`.
    ///
    /// # Errors
    ///
    /// Implementations backed by I/O may fail.
    fn resolve_build_location(&self, normalized_scm_uri: &str) -> Result<Option<PathBuf>>;

    /// Brings the store up to date with its origin. The default does nothing.
    fn refresh(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(futures::future::ready(Ok(())))
    }

    /// Human readable name for logs.
    fn describe(&self) -> String;
}
