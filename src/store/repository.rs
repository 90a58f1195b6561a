use super::{PathMatch, RecipeDirectory, RecipeLayout};
use crate::core::Coordinate;
use crate::git::{GitRepo, split_branch};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A recipe database kept in a git checkout.
///
/// A checkout reopened with [`from_checkout`](Self::from_checkout) is pulled on the
/// first [`refresh`](RecipeDirectory::refresh). After that, and when an update
/// interval is configured, it pulls from the remote at most once per interval.
/// Concurrent callers that all observe a stale checkout serialize on a lock and
/// re-check, so only one pull runs.
/// A failed pull fails the call; the checkout is left as it was.
#[derive(Debug)]
pub struct RecipeRepository {
    remote: String,
    branch: String,
    checkout: GitRepo,
    layout: RecipeLayout,
    update_interval: Option<Duration>,
    git_timeout: Option<Duration>,
    created: Instant,
    /// Milliseconds after `created` of the last successful sync
    last_update_ms: AtomicU64,
    /// Whether the checkout has been brought up to date since it was opened
    synced: AtomicBool,
    refresh_lock: Mutex<()>,
}

impl RecipeRepository {
    /// Clones a `url[#branch]` reference into `directory` and opens it.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::GitCloneFailed`](crate::core::RecipeError::GitCloneFailed)
    /// if the clone fails.
    pub async fn clone(
        reference: &str,
        directory: impl AsRef<Path>,
        update_interval: Option<Duration>,
        git_timeout: Option<Duration>,
    ) -> Result<Self> {
        let (remote, branch) = split_branch(reference);
        let checkout = GitRepo::clone_branch(remote, branch, directory.as_ref(), git_timeout)
            .await
            .with_context(|| format!("Failed to clone recipe repository {reference}"))?;
        let repo = Self::from_checkout(remote, branch, checkout, update_interval, git_timeout);
        repo.synced.store(true, Ordering::Release);
        Ok(repo)
    }

    /// Opens an existing checkout of `remote` at `branch`. It may be out of date, so
    /// the first refresh pulls regardless of the update interval.
    pub fn from_checkout(
        remote: &str,
        branch: &str,
        checkout: GitRepo,
        update_interval: Option<Duration>,
        git_timeout: Option<Duration>,
    ) -> Self {
        let layout = RecipeLayout::open(checkout.path());
        Self {
            remote: remote.to_string(),
            branch: branch.to_string(),
            checkout,
            layout,
            update_interval,
            git_timeout,
            created: Instant::now(),
            last_update_ms: AtomicU64::new(0),
            synced: AtomicBool::new(false),
            refresh_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn remote(&self) -> &str {
        &self.remote
    }

    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    #[must_use]
    pub fn local_path(&self) -> &Path {
        self.checkout.path()
    }

    #[must_use]
    pub const fn layout(&self) -> &RecipeLayout {
        &self.layout
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.created.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn is_stale(&self, interval: Duration) -> bool {
        let last = self.last_update_ms.load(Ordering::Acquire);
        let interval = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.now_ms().saturating_sub(last) >= interval
    }

    fn needs_refresh(&self) -> bool {
        if !self.synced.load(Ordering::Acquire) {
            return true;
        }
        self.update_interval.is_some_and(|interval| self.is_stale(interval))
    }

    /// Pulls from the remote if the checkout was reopened from disk and not yet
    /// pulled, or if the update interval has elapsed.
    ///
    /// # Errors
    ///
    /// Returns the pull failure.
    pub async fn refresh_if_stale(&self) -> Result<()> {
        if !self.needs_refresh() {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;
        if !self.needs_refresh() {
            tracing::trace!("{} was refreshed while waiting for the lock", self.remote);
            return Ok(());
        }

        tracing::info!("Refreshing recipe repository {} ({})", self.remote, self.branch);
        self.checkout
            .pull(self.git_timeout)
            .await
            .with_context(|| format!("Failed to refresh recipe repository {}", self.remote))?;
        self.last_update_ms.store(self.now_ms(), Ordering::Release);
        self.synced.store(true, Ordering::Release);
        Ok(())
    }
}

impl RecipeDirectory for RecipeRepository {
    fn resolve_locations(&self, coordinate: &Coordinate) -> Result<Option<PathMatch>> {
        self.layout.resolve_locations(coordinate)
    }

    fn resolve_build_location(&self, normalized_scm_uri: &str) -> Result<Option<PathBuf>> {
        Ok(self.layout.resolve_build_location(normalized_scm_uri))
    }

    fn refresh(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.refresh_if_stale())
    }

    fn describe(&self) -> String {
        format!("{}#{}", self.remote, self.branch)
    }
}
