//! SCM discovery from released POM files.
//!
//! Used when no `scm.yaml` recipe exists for a coordinate: the artifact's POM is
//! fetched from the artifact cache and its `<scm>` block (or project URL) is read.
//! If the POM declares nothing usable, its parent is tried, as long as the parent
//! belongs to the same group.

use super::scm_to_https;
use crate::core::{Coordinate, RecipeError};
use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

const GITHUB_PREFIX: &str = "https://github.com/";

/// The parts of a Maven POM that SCM discovery reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub url: Option<String>,
    pub parent: Option<PomParent>,
    pub scm: Option<PomScm>,
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PomParent {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PomScm {
    pub connection: Option<String>,
    pub url: Option<String>,
}

impl Pom {
    /// Parses POM XML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not well-formed XML.
    pub fn parse(xml: &str) -> Result<Self, serde_xml_rs::Error> {
        serde_xml_rs::from_str(xml)
    }

    /// The HTTPS origin this POM declares, with `${...}` placeholders expanded.
    ///
    /// A non-empty `<scm><connection>` wins. Otherwise the project `<url>` and then
    /// `<scm><url>` are used, but only when they point at GitHub.
    #[must_use]
    pub fn scm_origin(&self, version: &str) -> Option<String> {
        let scm = self.scm.as_ref();
        if let Some(connection) = scm.and_then(|s| s.connection.as_deref()).filter(|c| !c.trim().is_empty()) {
            return Some(scm_to_https(&self.interpolate(connection, version)));
        }

        [self.url.as_deref(), scm.and_then(|s| s.url.as_deref())]
            .into_iter()
            .flatten()
            .map(|url| self.interpolate(url.trim(), version))
            .find(|url| url.starts_with(GITHUB_PREFIX))
            .map(|url| scm_to_https(&url))
    }

    /// Expands `${name}` from the POM's properties. `project.version` is bound to
    /// `version`. Unknown placeholders are left as they are.
    #[must_use]
    pub fn interpolate(&self, value: &str, version: &str) -> String {
        PLACEHOLDER
            .replace_all(value, |caps: &regex::Captures<'_>| {
                let name = &caps[1];
                if name == "project.version" {
                    return version.to_string();
                }
                self.properties.get(name).cloned().unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Fetches POM files by coordinate.
pub trait PomSource: Send + Sync {
    /// Returns `Ok(None)` when the cache has no POM for `coordinate`.
    fn fetch_pom(&self, coordinate: &Coordinate) -> impl Future<Output = Result<Option<Pom>>> + Send;
}

/// A [`PomSource`] reading from a Maven-layout HTTP artifact cache.
#[derive(Debug, Clone)]
pub struct HttpPomSource {
    client: reqwest::Client,
    cache_url: String,
}

impl HttpPomSource {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(cache_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            RecipeError::NetworkError {
                operation: "create HTTP client".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            client,
            cache_url: cache_url.into(),
        })
    }

    #[must_use]
    pub fn cache_url(&self) -> &str {
        &self.cache_url
    }
}

/// `<cache>/<group/as/path>/<artifact>/<version>/<artifact>-<version>.pom`
#[must_use]
pub fn pom_url(cache_url: &str, coordinate: &Coordinate) -> String {
    format!(
        "{}/{}/{}/{}/{}-{}.pom",
        cache_url.trim_end_matches('/'),
        coordinate.group_id.replace('.', "/"),
        coordinate.artifact_id,
        coordinate.version,
        coordinate.artifact_id,
        coordinate.version
    )
}

impl PomSource for HttpPomSource {
    async fn fetch_pom(&self, coordinate: &Coordinate) -> Result<Option<Pom>> {
        let url = pom_url(&self.cache_url, coordinate);
        tracing::debug!("Fetching POM {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| RecipeError::NetworkError {
            operation: format!("fetch {url}"),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            tracing::warn!("No POM for {} at {}: HTTP {}", coordinate, url, response.status());
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| RecipeError::NetworkError {
            operation: format!("read {url}"),
            reason: e.to_string(),
        })?;
        match Pom::parse(&body) {
            Ok(pom) => Ok(Some(pom)),
            Err(e) => {
                tracing::warn!("Ignoring unparseable POM {}: {}", url, e);
                Ok(None)
            }
        }
    }
}

/// Walks the POM chain of `coordinate` until one declares an SCM origin.
///
/// Parents outside the coordinate's group are not followed. Returns `Ok(None)`
/// when the chain ends without an origin.
///
/// # Errors
///
/// Returns the fetch error if a POM cannot be retrieved.
pub async fn discover_scm<P: PomSource>(source: &P, coordinate: &Coordinate) -> Result<Option<String>> {
    let mut current = coordinate.clone();
    let mut seen = HashSet::new();

    while seen.insert(current.clone()) {
        let Some(pom) = source.fetch_pom(&current).await? else {
            return Ok(None);
        };
        if let Some(origin) = pom.scm_origin(&coordinate.version) {
            tracing::info!("Discovered SCM {} for {} from POM of {}", origin, coordinate, current);
            return Ok(Some(origin));
        }

        let Some(parent) = pom.parent else {
            return Ok(None);
        };
        let (Some(group), Some(artifact), Some(version)) = (parent.group_id, parent.artifact_id, parent.version)
        else {
            tracing::debug!("Incomplete parent declaration in POM of {}", current);
            return Ok(None);
        };
        if group != coordinate.group_id {
            tracing::debug!("Parent {}:{} of {} is outside group {}", group, artifact, current, coordinate.group_id);
            return Ok(None);
        }
        current = Coordinate::new(group, artifact, version);
    }

    tracing::warn!("POM parent chain of {} loops at {}", coordinate, current);
    Ok(None)
}
