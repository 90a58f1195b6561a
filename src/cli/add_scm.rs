use crate::authoring::{AddScmRequest, add_scm};
use crate::core::Coordinate;
use crate::recipe::TagMapping;
use crate::store::RecipeLayout;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Create or extend the scm.yaml recipe for a coordinate.
///
/// Writes to the first `--recipes` directory. Without `--group` the recipe is an
/// artifact override; `--version-scoped` narrows it to the coordinate's version.
#[derive(Args, Debug)]
pub struct AddScmCommand {
    /// Coordinate as `group:artifact:version`
    #[arg(value_name = "GAV")]
    coordinate: String,

    /// Repository URI. Optional when updating an existing recipe in place.
    #[arg(long)]
    uri: Option<String>,

    /// Sub-directory of the repository holding the build. `/` clears it.
    #[arg(long)]
    path: Option<String>,

    /// Write the recipe for the whole group instead of the artifact
    #[arg(long)]
    group: bool,

    /// Only apply the recipe to this version
    #[arg(long)]
    version_scoped: bool,

    /// Add the URI as a legacy repository of the existing recipe
    #[arg(long)]
    legacy: bool,

    /// Version to tag rule as `pattern=tag`. Repeatable.
    #[arg(long = "tag-mapping", value_name = "PATTERN=TAG", value_parser = parse_tag_mapping)]
    tag_mappings: Vec<TagMapping>,
}

impl AddScmCommand {
    pub fn execute(self, recipe_dirs: &[PathBuf]) -> Result<()> {
        let Some(root) = recipe_dirs.first() else {
            bail!("add-scm needs a local recipe database: pass --recipes <dir>");
        };

        let mut request = AddScmRequest::new(Coordinate::parse(&self.coordinate)?)
            .group_scoped(self.group)
            .version_scoped(self.version_scoped)
            .legacy(self.legacy);
        request.uri = self.uri;
        request.path = self.path;
        request.tag_mappings = self.tag_mappings;

        let written = add_scm(&RecipeLayout::open(root), &request)?;
        println!("{} {}", "Wrote".green(), written.display());
        Ok(())
    }
}

fn parse_tag_mapping(input: &str) -> Result<TagMapping, String> {
    match input.split_once('=') {
        Some((pattern, tag)) if !pattern.is_empty() => Ok(TagMapping::new(pattern, tag)),
        _ => Err(format!("expected PATTERN=TAG, got '{input}'")),
    }
}
