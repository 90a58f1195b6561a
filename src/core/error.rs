//! Error handling for recipedb
//!
//! This module provides the error types used across the recipe database and the
//! SCM tag resolver, together with user-friendly error reporting for the CLI.
//! The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can tell an ambiguous tag apart from a
//!    transport failure or a redirect loop
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! Errors map onto the resolution failure taxonomy:
//! - **Not found**: an absent group is *not* an error, lookups return empty results.
//!   [`RecipeError::ScmNotFound`] is raised only when no repository can be determined
//!   for a coordinate at all.
//! - **Ambiguous**: [`RecipeError::AmbiguousTag`] carries the candidate tag set.
//! - **Cycle**: [`RecipeError::RedirectCycle`] aborts the whole lookup.
//! - **Transport**: [`RecipeError::GitCommandError`], [`RecipeError::NetworkError`], etc.
//! - **Malformed data**: [`RecipeError::RecipeParseError`]. Recipe stores log and skip
//!   malformed redirect markers instead of raising this error.
//!
//! Most functions return [`anyhow::Result`] and attach context with
//! `.with_context(..)`. Typed errors can be recovered with
//! `error.downcast_ref::<RecipeError>()`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use recipedb_cli::core::{RecipeError, user_friendly_error};
//!
//! let err = anyhow::Error::from(RecipeError::NoMatchingTag {
//!     version: "1.0".to_string(),
//! });
//! let ctx = user_friendly_error(err);
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for recipe resolution.
///
/// Each variant describes a specific failure mode. Variants that correspond to a
/// recoverable per-repository failure (transport, ambiguity) are collected by the
/// tag resolver, which only surfaces the first one once every candidate repository
/// has been exhausted.
#[derive(Error, Debug)]
pub enum RecipeError {
    /// A chain of `redirect.yaml` markers revisited a directory.
    ///
    /// # Fields
    /// - `chain`: The directories visited while following redirects, in order
    #[error("Redirect loop detected: {chain}")]
    RedirectCycle {
        /// The directories visited while following redirects
        chain: String,
    },

    /// More than one tag is an equally good match for a version.
    #[error("Could not determine tag for {version}, multiple possible tags were found: {}", .candidates.join(", "))]
    AmbiguousTag {
        /// The version being resolved
        version: String,
        /// Every tag that could plausibly correspond to the version
        candidates: Vec<String>,
    },

    /// No tag in the repository could be matched to the version.
    #[error("Could not determine tag for {version}")]
    NoMatchingTag {
        /// The version being resolved
        version: String,
    },

    /// Neither the recipe database nor the POM chain names a repository.
    #[error("Unable to determine SCM repo for {coordinate}")]
    ScmNotFound {
        /// The coordinate in `group:artifact:version` form
        coordinate: String,
    },

    /// A `group:artifact:version` string could not be parsed.
    #[error("Not a valid coordinate: {input}")]
    InvalidCoordinate {
        /// The offending input
        input: String,
    },

    /// Git operation failed during execution
    ///
    /// # Fields
    /// - `operation`: The git operation that failed (e.g., "clone", "ls-remote", "pull")
    /// - `stderr`: The error output from the git command
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git operation that failed
        operation: String,
        /// The error output from the git command
        stderr: String,
    },

    /// Git executable not found in PATH
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// Git repository clone failed
    #[error("Failed to clone repository: {url}")]
    GitCloneFailed {
        /// The repository URL that failed to clone
        url: String,
        /// The reason for the clone failure
        reason: String,
    },

    /// HTTP request failed
    #[error("Network error: {operation}")]
    NetworkError {
        /// The operation that failed, usually the URL being fetched
        operation: String,
        /// The underlying reason
        reason: String,
    },

    /// A recipe file exists but could not be decoded.
    #[error("Invalid recipe file {file}: {reason}")]
    RecipeParseError {
        /// Path of the recipe file
        file: String,
        /// Decoder message
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML decoding or encoding error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl RecipeError {
    /// Returns true for failures that are specific to one candidate repository
    /// (transport problems, missing or ambiguous tags).
    #[must_use]
    pub const fn is_candidate_failure(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousTag { .. }
                | Self::NoMatchingTag { .. }
                | Self::GitCommandError { .. }
                | Self::GitCloneFailed { .. }
                | Self::NetworkError { .. }
        )
    }
}

impl Clone for RecipeError {
    fn clone(&self) -> Self {
        match self {
            Self::RedirectCycle {
                chain,
            } => Self::RedirectCycle {
                chain: chain.clone(),
            },
            Self::AmbiguousTag {
                version,
                candidates,
            } => Self::AmbiguousTag {
                version: version.clone(),
                candidates: candidates.clone(),
            },
            Self::NoMatchingTag {
                version,
            } => Self::NoMatchingTag {
                version: version.clone(),
            },
            Self::ScmNotFound {
                coordinate,
            } => Self::ScmNotFound {
                coordinate: coordinate.clone(),
            },
            Self::InvalidCoordinate {
                input,
            } => Self::InvalidCoordinate {
                input: input.clone(),
            },
            Self::GitCommandError {
                operation,
                stderr,
            } => Self::GitCommandError {
                operation: operation.clone(),
                stderr: stderr.clone(),
            },
            Self::GitNotFound => Self::GitNotFound,
            Self::GitCloneFailed {
                url,
                reason,
            } => Self::GitCloneFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::RecipeParseError {
                file,
                reason,
            } => Self::RecipeParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::YamlError(e) => Self::Other {
                message: format!("YAML error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// Wraps a [`RecipeError`] with an optional suggestion and details, and renders
/// it with colors for terminal output.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: RecipeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`RecipeError`]
    #[must_use]
    pub const fn new(error: RecipeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// Typed [`RecipeError`]s anywhere in the chain get tailored suggestions; other
/// errors are reported with their full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(recipe_error) = error.chain().find_map(|e| e.downcast_ref::<RecipeError>()) {
        return create_error_context(recipe_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(RecipeError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your recipedb config file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(RecipeError::Other {
        message,
    })
}

fn create_error_context(error: RecipeError) -> ErrorContext {
    match &error {
        RecipeError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git from https://git-scm.com/ and make sure it is on your PATH"),
        RecipeError::RedirectCycle {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove or correct one of the redirect.yaml files in the chain")
            .with_details("Redirects may point at other coordinates but must never lead back to a directory already visited"),
        RecipeError::AmbiguousTag {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Add a tagMapping entry to the scm.yaml recipe for this artifact to select the tag explicitly"),
        RecipeError::NoMatchingTag {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Add a tagMapping entry, or a legacyRepos entry if the project moved repositories"),
        RecipeError::ScmNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Add an scm.yaml recipe for the group with `recipedb add-scm`")
            .with_details("No recipe matched and the POM chain did not declare a usable <scm> section"),
        RecipeError::GitCloneFailed {
            reason,
            ..
        }
        | RecipeError::GitCommandError {
            stderr: reason,
            ..
        } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check the repository URL and your network connection")
                .with_details(details)
        }
        RecipeError::NetworkError {
            reason,
            ..
        } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check that the configured cache_url is reachable")
                .with_details(details)
        }
        _ => ErrorContext::new(error),
    }
}
