use anyhow::Result;
use recipedb_cli::config::ResolverConfig;
use recipedb_cli::core::{Coordinate, RecipeError};
use recipedb_cli::resolver::RecipeResolver;
use recipedb_cli::scm::{ScmStrategy, ScmTagResolver};
use recipedb_cli::store::{RecipeDirectory, RecipeLayout};
use recipedb_cli::test_utils::{RecipeTree, ScmRecipeFixture};
use std::path::Path;
use std::sync::Arc;

use crate::common::TestWorkspace;

fn recipes(root: &Path) -> Arc<RecipeResolver> {
    Arc::new(RecipeResolver::new(vec![Arc::new(RecipeLayout::open(root)) as Arc<dyn RecipeDirectory>]))
}

fn tag_resolver(db: &RecipeTree, cache_tags: bool) -> Result<ScmTagResolver> {
    let config = ResolverConfig::builder().no_recipe_repos().cache_repo_tags(cache_tags).build();
    Ok(ScmTagResolver::from_config(recipes(db.root()), &config)?.with_strategies(vec![ScmStrategy::Recipe]))
}

fn recipe_error(err: &anyhow::Error) -> Option<&RecipeError> {
    err.chain().find_map(|e| e.downcast_ref::<RecipeError>())
}

#[tokio::test]
async fn test_lightweight_tag_resolves_to_commit() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let source = ws.source_repo("widget", &["1.0.0", "1.1.0"])?;
    let db = ws.database("db");
    db.scm("org.acme", None, None, &ScmRecipeFixture::uri(&source.file_url()))?;

    let resolver = tag_resolver(&db, false)?;
    let info = resolver.resolve_tag_info(&Coordinate::parse("org.acme:widget:1.1.0")?).await?;

    assert_eq!(info.tag, "1.1.0");
    assert_eq!(info.repo.uri, source.file_url());
    assert_eq!(info.hash, Some(source.get_commit_hash()?));
    Ok(())
}

#[tokio::test]
async fn test_annotated_tag_reports_peeled_commit() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let source = ws.source_repo("widget", &[])?;
    source.annotated_tag("v2.1.0", "Release 2.1.0")?;
    let db = ws.database("db");
    db.scm("org.acme", None, None, &ScmRecipeFixture::uri(&source.file_url()))?;

    let resolver = tag_resolver(&db, false)?;
    let info = resolver.resolve_tag_info(&Coordinate::parse("org.acme:widget:2.1.0")?).await?;

    assert_eq!(info.tag, "v2.1.0");
    assert_eq!(info.hash, Some(source.rev_parse("HEAD")?));
    assert_ne!(info.hash, Some(source.rev_parse("v2.1.0")?));
    Ok(())
}

#[tokio::test]
async fn test_tag_mapping_against_real_repository() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let source = ws.source_repo("widget", &["release-3.0", "3.0.1"])?;
    let db = ws.database("db");
    db.scm("org.acme", None, None, &ScmRecipeFixture::with_mapping(&source.file_url(), r"(\d+\.\d+)\.Final", "release-$1"))?;

    let resolver = tag_resolver(&db, false)?;
    let info = resolver.resolve_tag_info(&Coordinate::parse("org.acme:widget:3.0.Final")?).await?;
    assert_eq!(info.tag, "release-3.0");
    Ok(())
}

#[tokio::test]
async fn test_legacy_repository_is_searched_after_primary() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let current = ws.source_repo("current", &["2.0.0"])?;
    let legacy = ws.source_repo("legacy", &["1.0.0"])?;
    let db = ws.database("db");
    db.scm("org.acme", None, None, &ScmRecipeFixture::with_legacy(&current.file_url(), &legacy.file_url()))?;

    let resolver = tag_resolver(&db, false)?;

    let new = resolver.resolve_tag_info(&Coordinate::parse("org.acme:widget:2.0.0")?).await?;
    assert_eq!(new.repo.uri, current.file_url());

    let old = resolver.resolve_tag_info(&Coordinate::parse("org.acme:widget:1.0.0")?).await?;
    assert_eq!(old.repo.uri, legacy.file_url());
    assert_eq!(old.hash, Some(legacy.get_commit_hash()?));
    Ok(())
}

#[tokio::test]
async fn test_missing_tag_reports_primary_failure() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let source = ws.source_repo("widget", &["1.0.0"])?;
    let db = ws.database("db");
    db.scm("org.acme", None, None, &ScmRecipeFixture::uri(&source.file_url()))?;

    let resolver = tag_resolver(&db, false)?;
    let err = resolver.resolve_tag_info(&Coordinate::parse("org.acme:widget:9.9.9")?).await.unwrap_err();
    assert!(matches!(recipe_error(&err), Some(RecipeError::NoMatchingTag { .. })), "unexpected error: {err:#}");
    Ok(())
}

#[tokio::test]
async fn test_tag_cache_keeps_first_listing() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let source = ws.source_repo("widget", &["1.0.0"])?;
    let db = ws.database("db");
    db.scm("org.acme", None, None, &ScmRecipeFixture::uri(&source.file_url()))?;

    let cached = tag_resolver(&db, true)?;
    let uncached = tag_resolver(&db, false)?;
    let first = Coordinate::parse("org.acme:widget:1.0.0")?;
    cached.resolve_tag_info(&first).await?;
    uncached.resolve_tag_info(&first).await?;

    source.commit_file("README.md", "2.0.0\n", "Release 2.0.0")?;
    source.tag("2.0.0")?;
    let second = Coordinate::parse("org.acme:widget:2.0.0")?;

    assert!(cached.resolve_tag_info(&second).await.is_err());
    let fresh = uncached.resolve_tag_info(&second).await?;
    assert_eq!(fresh.hash, Some(source.get_commit_hash()?));
    Ok(())
}

#[tokio::test]
async fn test_unknown_coordinate_is_scm_not_found() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    db.scm("org.acme", None, None, &ScmRecipeFixture::uri("https://github.com/acme/widget"))?;

    let resolver = tag_resolver(&db, false)?;
    let err = resolver.resolve_tag_info(&Coordinate::parse("com.unknown:thing:1.0")?).await.unwrap_err();
    assert!(matches!(recipe_error(&err), Some(RecipeError::ScmNotFound { .. })), "unexpected error: {err:#}");
    Ok(())
}
