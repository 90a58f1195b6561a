use super::{Recipe, RecipeKind};
use serde::{Deserialize, Serialize};

/// Contents of a `build.yaml` recipe, keyed by repository rather than coordinate.
///
/// Every field is optional; an empty recipe means "build with the defaults".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecipeInfo {
    /// Force the project version to the requested one before building
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enforce_version: bool,

    /// Extra arguments passed to the build tool
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,

    /// Artifacts produced by the build that should not be deployed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_artifacts: Vec<String>,

    /// Additional Maven repositories needed to resolve build dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_build_script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_build_script: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_submodules: bool,
}

impl Recipe for BuildRecipeInfo {
    fn kind() -> RecipeKind {
        RecipeKind::BUILD
    }
}
