use crate::core::RecipeError;
use crate::recipe::RepositoryInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A buildable unit, identified by Maven group, artifact and version.
///
/// Equality and hashing use all three fields. The group's dot-separated segments map
/// one-to-one onto directories in a recipe store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Maven group id, e.g. `io.quarkus`
    pub group_id: String,
    /// Maven artifact id, e.g. `quarkus-core`
    pub artifact_id: String,
    /// Released version string, e.g. `2.2.0.Final`
    pub version: String,
}

impl Coordinate {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Parses a `group:artifact:version` string.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::InvalidCoordinate`] unless the input has exactly three
    /// non-empty colon-separated parts, the group has no empty segment, and no part
    /// could name a directory outside a recipe store.
    pub fn parse(input: &str) -> Result<Self, RecipeError> {
        let parts: Vec<&str> = input.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !artifact.is_empty()
                    && !version.is_empty()
                    && group.split('.').all(|s| !s.is_empty()) =>
            {
                let coordinate = Self::new(*group, *artifact, *version);
                if coordinate.is_path_safe() {
                    Ok(coordinate)
                } else {
                    Err(RecipeError::InvalidCoordinate {
                        input: input.to_string(),
                    })
                }
            }
            _ => Err(RecipeError::InvalidCoordinate {
                input: input.to_string(),
            }),
        }
    }

    /// Whether every part can be used as a directory name below a store root: no
    /// path separators and no `.` or `..`. Empty artifact and version are allowed.
    #[must_use]
    pub fn is_path_safe(&self) -> bool {
        self.group_id.split('.').all(is_safe_segment)
            && is_safe_segment(&self.artifact_id)
            && is_safe_segment(&self.version)
    }

    /// The group id split into its directory segments.
    pub fn group_segments(&self) -> impl Iterator<Item = &str> {
        self.group_id.split('.').filter(|s| !s.is_empty())
    }
}

fn is_safe_segment(segment: &str) -> bool {
    segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The outcome of tag discovery: which repository, which tag, and the commit it
/// points at (when the remote listing provided one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    /// Repository the tag was found in
    pub repo: RepositoryInfo,
    /// Selected tag name, without the `refs/tags/` prefix
    pub tag: String,
    /// Commit hash for the tag. `None` for explicit tag-mapping references that are
    /// not present in the remote listing.
    pub hash: Option<String>,
}
