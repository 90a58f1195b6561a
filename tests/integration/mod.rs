//! Integration test suite for recipedb
//!
//! End-to-end tests against real recipe databases on disk, real git repositories
//! served over `file://` URLs, and the `recipedb` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **recipe_resolution**: layered databases, redirects, git-backed databases
//! - **tag_resolution**: tag discovery against real remote tag listings
//! - **cli**: the command line

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod recipe_resolution;
mod tag_resolution;
