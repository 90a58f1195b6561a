//! `lookup-scm` and `lookup-recipes`.

use super::OutputFormat;
use crate::config::ResolverConfig;
use crate::core::{Coordinate, TagInfo, user_friendly_error};
use crate::recipe::RecipeKind;
use crate::resolver::RecipeResolver;
use crate::scm::ScmTagResolver;
use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve coordinates to source repository tags.
#[derive(Args, Debug)]
pub struct LookupScmCommand {
    /// Coordinates as `group:artifact:version`
    #[arg(required = true, value_name = "GAV")]
    coordinates: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Cache tag listings between coordinates that share a repository
    #[arg(long)]
    cache_tags: bool,
}

#[derive(Debug, Serialize)]
struct ScmLookup {
    coordinate: String,
    #[serde(flatten)]
    info: TagInfo,
}

impl LookupScmCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let coordinates = parse_coordinates(&self.coordinates)?;
        let recipes = Arc::new(RecipeResolver::from_config(config).await?);
        let resolver =
            ScmTagResolver::from_config(recipes, config)?.with_tag_cache(self.cache_tags || config.cache_repo_tags);

        let mut found = Vec::new();
        let mut failed = 0usize;
        for coordinate in coordinates {
            match resolver.resolve_tag_info(&coordinate).await {
                Ok(info) => found.push(ScmLookup {
                    coordinate: coordinate.to_string(),
                    info,
                }),
                Err(e) => {
                    eprintln!("{coordinate}:");
                    user_friendly_error(e).display();
                    failed += 1;
                }
            }
        }

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
            OutputFormat::Text => {
                for lookup in &found {
                    println!(
                        "{}\t{}\t{}\t{}",
                        lookup.coordinate,
                        lookup.info.repo.uri,
                        lookup.info.tag,
                        lookup.info.hash.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        if failed > 0 {
            bail!("{failed} of {} coordinates could not be resolved", failed + found.len());
        }
        Ok(())
    }
}

/// Print recipe file locations for coordinates.
#[derive(Args, Debug)]
pub struct LookupRecipesCommand {
    /// Coordinates as `group:artifact:version`
    #[arg(required = true, value_name = "GAV")]
    coordinates: Vec<String>,

    /// Recipe kinds to look up, e.g. `scm` or `build`. Repeatable.
    #[arg(long = "kind", default_values = ["scm", "build"])]
    kinds: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl LookupRecipesCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let coordinates = parse_coordinates(&self.coordinates)?;
        let kinds: Vec<RecipeKind> = self.kinds.iter().map(|k| RecipeKind::from_name(k)).collect();
        let resolver = RecipeResolver::from_config(config).await?;
        let found = resolver.resolve(&coordinates, &kinds).await?;

        let mut report: BTreeMap<String, BTreeMap<String, PathBuf>> = BTreeMap::new();
        for coordinate in &coordinates {
            let entry = report.entry(coordinate.to_string()).or_default();
            if let Some(locations) = found.get(coordinate) {
                for (kind, path) in locations {
                    entry.insert(kind.name().to_string(), path.clone());
                }
            }
        }
        print_locations(&report, self.format)
    }
}

/// Prints `key -> kind -> path` results. Keys with no files get a `-` line in text
/// output so every requested key shows up.
pub(super) fn print_locations(report: &BTreeMap<String, BTreeMap<String, PathBuf>>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for (key, locations) in report {
                if locations.is_empty() {
                    println!("{key}\t-\t-");
                }
                for (kind, path) in locations {
                    println!("{key}\t{kind}\t{}", path.display());
                }
            }
        }
    }
    Ok(())
}

fn parse_coordinates(inputs: &[String]) -> Result<Vec<Coordinate>> {
    inputs.iter().map(|s| Coordinate::parse(s).map_err(Into::into)).collect()
}
