use super::OutputFormat;
use super::lookup::print_locations;
use crate::config::ResolverConfig;
use crate::recipe::{BuildRecipeInfo, RecipeKind, encode_recipe};
use crate::resolver::{RecipeResolver, normalize_scm_uri};
use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Print the build recipes recorded for a source repository.
#[derive(Args, Debug)]
pub struct BuildInfoCommand {
    /// Source repository URI, e.g. `https://github.com/quarkusio/quarkus.git`
    #[arg(value_name = "SCM_URI")]
    scm_uri: String,

    /// Recipe kinds to look up. Repeatable.
    #[arg(long = "kind", default_values = ["build"])]
    kinds: Vec<String>,

    /// Print the effective build recipe instead of file locations
    #[arg(long, conflicts_with = "kinds")]
    show: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl BuildInfoCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let resolver = RecipeResolver::from_config(config).await?;

        if self.show {
            let recipe = resolver.resolve_build_recipe(&self.scm_uri).await?.unwrap_or_default();
            match self.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recipe)?),
                OutputFormat::Text => print!("{}", encode_recipe::<BuildRecipeInfo>(&recipe)?),
            }
            return Ok(());
        }

        let kinds: Vec<RecipeKind> = self.kinds.iter().map(|k| RecipeKind::from_name(k)).collect();
        let found = resolver.resolve_build_info(&self.scm_uri, &kinds).await?;
        let locations: BTreeMap<String, PathBuf> = found.into_iter().map(|(kind, path)| (kind.name().to_string(), path)).collect();

        let mut report = BTreeMap::new();
        report.insert(normalize_scm_uri(&self.scm_uri), locations);
        print_locations(&report, self.format)
    }
}
