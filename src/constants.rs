//! Constants shared across recipedb modules.
//!
//! Timeouts, default URLs and the reserved names of the on-disk recipe layout.

use std::time::Duration;

/// Default timeout for a single git invocation (120 seconds).
///
/// Applies to clones, pulls and remote tag listings unless the configuration
/// overrides it with `git_timeout_secs`.
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for fetching a POM from the artifact cache (30 seconds).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Public recipe database used when no repositories are configured.
pub const DEFAULT_RECIPE_REPO: &str = "https://github.com/redhat-appstudio/jvm-build-data";

/// Artifact cache queried for POM files when no recipe names a repository.
pub const DEFAULT_CACHE_URL: &str = "https://repo.maven.apache.org/maven2";

/// Root of coordinate-keyed recipes inside a recipe database.
pub const SCM_INFO_DIR: &str = "scm-info";

/// Older name of [`SCM_INFO_DIR`], used when the new directory is absent.
pub const LEGACY_SCM_INFO_DIR: &str = "recipes";

/// Root of repository-keyed build recipes inside a recipe database.
pub const BUILD_INFO_DIR: &str = "build-info";

/// Reserved directory that holds artifact-specific overrides.
pub const ARTIFACT_DIR: &str = "_artifact";

/// Reserved directory that holds version-specific overrides.
pub const VERSION_DIR: &str = "_version";

/// Marker file that re-points a directory level at another coordinate.
pub const REDIRECT_FILE: &str = "redirect.yaml";

/// Name of the per-user configuration directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".recipedb";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "RECIPEDB_CONFIG";
