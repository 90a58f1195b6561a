//! Version to tag matching.
//!
//! Three passes, each only reached when the previous one selected nothing:
//!
//! 1. **Mappings**: the first [`TagMapping`] whose pattern matches the whole version
//!    produces the tag. The produced tag must exist remotely, unless the template has
//!    no `$` reference at all, in which case it is an explicit ref and always used.
//! 2. **Exact**: a tag named exactly like the version.
//! 3. **Fuzzy**: tags containing the version, or contained in it, narrowed down by
//!    suffix and numeric-prefix rules. Anything that is not a single clear winner is
//!    an error.

use crate::core::RecipeError;
use crate::recipe::TagMapping;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)*").unwrap_or_else(|e| panic!("invalid numeric prefix pattern: {e}"))
});

/// Selects the tag in `tags` (name to hash) that corresponds to `version`.
///
/// # Errors
///
/// Returns [`RecipeError::AmbiguousTag`] when several tags are equally plausible and
/// [`RecipeError::NoMatchingTag`] when none is.
pub fn select_tag(
    version: &str,
    mappings: &[TagMapping],
    tags: &HashMap<String, String>,
) -> Result<String, RecipeError> {
    if let Some(tag) = apply_mappings(version, mappings, tags) {
        return Ok(tag);
    }

    if tags.contains_key(version) {
        tracing::debug!("Exact tag match for {}", version);
        return Ok(version.to_string());
    }

    let mut contains_version: Vec<&str> =
        tags.keys().map(String::as_str).filter(|t| t.contains(version)).collect();
    let contained_in_version: Vec<&str> =
        tags.keys().map(String::as_str).filter(|t| !t.is_empty() && version.contains(*t)).collect();
    contains_version.sort_unstable();

    if let [only] = contains_version.as_slice() {
        return Ok((*only).to_string());
    }

    let ends_with: Vec<&str> = contains_version.iter().copied().filter(|t| t.ends_with(version)).collect();
    match ends_with.as_slice() {
        [only] => return Ok((*only).to_string()),
        [] => {}
        _ => {
            return Err(RecipeError::AmbiguousTag {
                version: version.to_string(),
                candidates: ends_with.iter().map(ToString::to_string).collect(),
            });
        }
    }

    if let [only] = contained_in_version.as_slice() {
        if numeric_prefix(only).is_some() && numeric_prefix(only) == numeric_prefix(version) {
            return Ok((*only).to_string());
        }
        tracing::debug!("Tag {} is contained in {} but its numeric part differs", only, version);
    }

    if contains_version.len() > 1 {
        return Err(RecipeError::AmbiguousTag {
            version: version.to_string(),
            candidates: contains_version.iter().map(ToString::to_string).collect(),
        });
    }

    Err(RecipeError::NoMatchingTag {
        version: version.to_string(),
    })
}

fn apply_mappings(version: &str, mappings: &[TagMapping], tags: &HashMap<String, String>) -> Option<String> {
    for mapping in mappings {
        let pattern = match Regex::new(&format!("^(?:{})$", mapping.pattern)) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!("Skipping invalid tag mapping pattern '{}': {}", mapping.pattern, e);
                continue;
            }
        };
        let Some(captures) = pattern.captures(version) else {
            continue;
        };

        // Highest group first so `$1` does not clobber `$10`
        let mut tag = mapping.tag.clone();
        for i in (0..captures.len()).rev() {
            let value = captures.get(i).map_or("", |m| m.as_str());
            tag = tag.replace(&format!("${i}"), value);
        }

        tracing::debug!("Tag mapping '{}' maps {} to {}", mapping.pattern, version, tag);
        if tags.contains_key(&tag) || !mapping.tag.contains('$') {
            return Some(tag);
        }
    }
    None
}

/// The first run of dot-separated digits, e.g. `1.2.3` in `v1.2.3.Final`.
fn numeric_prefix(s: &str) -> Option<&str> {
    NUMERIC_PREFIX.find(s).map(|m| m.as_str())
}
