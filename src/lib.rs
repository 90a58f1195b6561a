//! recipedb - build recipe resolution for Maven coordinates
//!
//! A recipe database is a directory tree of YAML files describing how to rebuild
//! released Maven artifacts from source: where the code lives (`scm.yaml`), and
//! how to build it (`build.yaml`). Recipes can be attached to a whole group, to one
//! artifact, to one version, or to one artifact version, and the most specific one
//! wins. Several databases, local or in git, can be layered in priority order.
//!
//! # Architecture Overview
//!
//! - [`store`] - one recipe database on disk, with `redirect.yaml` aliasing, and
//!   git-backed databases that refresh on an interval
//! - [`resolver`] - precedence resolution across databases with a per-group cache
//! - [`scm`] - works out which tag of which repository a release was built from,
//!   using recipes first and the artifact's POM ancestry as a fallback
//! - [`authoring`] - creating and extending `scm.yaml` recipes
//!
//! ## Supporting Modules
//! - [`recipe`] - recipe kinds and their typed YAML payloads
//! - [`core`] - coordinates, tag results and the error type
//! - [`git`] - git operations through the system `git` binary
//! - [`config`] - `~/.recipedb/config.toml`
//! - [`cli`] - the `recipedb` command line
//!
//! # Database Layout
//!
//! ```text
//! scm-info/
//!   io/quarkus/
//!     scm.yaml                         # group level
//!     _artifact/quarkus-core/
//!       scm.yaml                       # artifact override
//!       _version/2.2.0.Final/build.yaml # artifact + version override
//!     _version/1.0/redirect.yaml       # alias to another coordinate
//! build-info/
//!   github.com/quarkusio/quarkus/build.yaml
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use recipedb_cli::config::ResolverConfig;
//! use recipedb_cli::core::Coordinate;
//! use recipedb_cli::resolver::RecipeResolver;
//! use recipedb_cli::scm::ScmTagResolver;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ResolverConfig::load_with_optional(None).await?;
//! let recipes = Arc::new(RecipeResolver::from_config(&config).await?);
//! let tags = ScmTagResolver::from_config(recipes, &config)?;
//!
//! let info = tags.resolve_tag_info(&Coordinate::parse("io.quarkus:quarkus-core:2.2.0.Final")?).await?;
//! println!("{} @ {} ({:?})", info.repo.uri, info.tag, info.hash);
//! # Ok(())
//! # }
//! ```

pub mod authoring;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod git;
pub mod recipe;
pub mod resolver;
pub mod scm;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
