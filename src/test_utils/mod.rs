//! Test utilities for recipedb
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests.

pub mod fixtures;
pub mod git_helper;

pub use fixtures::{RecipeTree, ScmRecipeFixture};
pub use git_helper::TestGit;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. `level` wins over `RUST_LOG`; with neither,
/// logging stays off.
///
/// ```rust,no_run
/// use tracing::Level;
///
/// recipedb_cli::test_utils::init_test_logging(Some(Level::DEBUG));
/// ```
///
/// To enable logging in tests via environment variable:
/// ```bash
/// RUST_LOG=git=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true) // Show module targets like "git"
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
