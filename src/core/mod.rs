//! Core types and error handling for recipedb
//!
//! - [`error`] - The [`RecipeError`] enum and user-facing [`ErrorContext`]
//! - [`Coordinate`] - The (group, artifact, version) triple every lookup is keyed by
//! - [`TagInfo`] - Final result of SCM tag discovery

pub mod error;
mod coordinate;

pub use coordinate::{Coordinate, TagInfo};
pub use error::{ErrorContext, RecipeError, user_friendly_error};
