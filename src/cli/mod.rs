//! Command-line interface for recipedb.
//!
//! # Available Commands
//!
//! - `lookup-scm` - Find the repository, tag and commit a release was built from
//! - `lookup-recipes` - Print the recipe files that apply to coordinates
//! - `build-info` - Print the build recipe files for a source repository
//! - `add-scm` - Create or extend an `scm.yaml` recipe in a local database
//!
//! # Recipe Sources
//!
//! By default the git recipe repositories from the configuration file
//! (`~/.recipedb/config.toml`) are cloned and searched. `--recipes <dir>` replaces
//! them with local database directories, in priority order:
//!
//! ```bash
//! recipedb --recipes ./jvm-build-data lookup-recipes io.quarkus:quarkus-core:2.2.0.Final
//! recipedb lookup-scm --format json com.google.guava:guava:31.1-jre
//! recipedb --recipes ./db add-scm io.acme:widget:1.0 --uri https://github.com/acme/widget --group
//! ```
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--config` - Path to a custom config file

mod add_scm;
mod build_info;
mod lookup;


use crate::config::ResolverConfig;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One tab-separated line per result
    #[default]
    Text,
    /// A JSON document on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "recipedb",
    about = "Resolve build recipes and source tags for Maven coordinates",
    version,
    long_about = "recipedb looks up build recipes in layered recipe databases and works out which \
                  source repository tag a released artifact was built from."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging. Equivalent to `RUST_LOG=debug`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a custom configuration file.
    ///
    /// Overrides `RECIPEDB_CONFIG` and the default `~/.recipedb/config.toml`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Local recipe database directory, highest priority first. Repeatable.
    ///
    /// When given, the configured recipe repositories are not used.
    #[arg(long = "recipes", value_name = "DIR", global = true)]
    recipes: Vec<PathBuf>,

    /// Git recipe repository as `url[#branch]`, highest priority first. Repeatable.
    ///
    /// Replaces the configured recipe repositories.
    #[arg(long = "recipe-repo", value_name = "URL", global = true)]
    recipe_repos: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find the source tag each coordinate was released from.
    LookupScm(lookup::LookupScmCommand),

    /// Print the recipe files that apply to each coordinate.
    LookupRecipes(lookup::LookupRecipesCommand),

    /// Print the build recipe files for a source repository.
    BuildInfo(build_info::BuildInfoCommand),

    /// Create or extend an scm.yaml recipe in a local recipe database.
    AddScm(add_scm::AddScmCommand),
}

impl Cli {
    /// Sets up logging, loads the configuration and runs the subcommand.
    ///
    /// # Errors
    ///
    /// Returns the subcommand's error.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_level());
        let config = self.load_config().await?;

        match self.command {
            Commands::LookupScm(cmd) => cmd.execute(&config).await,
            Commands::LookupRecipes(cmd) => cmd.execute(&config).await,
            Commands::BuildInfo(cmd) => cmd.execute(&config).await,
            Commands::AddScm(cmd) => cmd.execute(&self.recipes),
        }
    }

    fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            None
        } else {
            Some("warn")
        }
    }

    /// The configuration file with command-line overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is invalid.
    pub async fn load_config(&self) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::load_with_optional(self.config.clone()).await?;
        if !self.recipes.is_empty() {
            config.local_recipe_dirs.clone_from(&self.recipes);
            config.recipe_repos.clear();
        }
        if !self.recipe_repos.is_empty() {
            config.recipe_repos.clone_from(&self.recipe_repos);
        }
        Ok(config)
    }
}

/// Installs a stderr subscriber. `RUST_LOG` takes precedence over `level`; with
/// neither, only errors are shown.
fn init_logging(level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level.unwrap_or("error"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
