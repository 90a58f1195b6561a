use anyhow::Result;
use recipedb_cli::config::ResolverConfig;
use recipedb_cli::core::{Coordinate, RecipeError};
use recipedb_cli::recipe::{BuildRecipeInfo, RecipeKind};
use recipedb_cli::resolver::RecipeResolver;
use recipedb_cli::store::{RecipeDirectory, RecipeLayout};
use recipedb_cli::test_utils::ScmRecipeFixture;
use std::sync::Arc;
use std::time::Duration;

use crate::common::TestWorkspace;

fn layered(roots: &[&std::path::Path]) -> RecipeResolver {
    RecipeResolver::new(
        roots.iter().map(|r| Arc::new(RecipeLayout::open(r)) as Arc<dyn RecipeDirectory>).collect(),
    )
}

#[tokio::test]
async fn test_specific_override_in_lower_priority_database_wins() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let high = ws.database("high");
    let low = ws.database("low");
    high.scm("io.quarkus", None, None, &ScmRecipeFixture::uri("https://github.com/quarkusio/quarkus"))?;
    let version_override =
        low.scm("io.quarkus", None, Some("1.0"), &ScmRecipeFixture::uri("https://github.com/quarkusio/legacy"))?;

    let resolver = layered(&[high.root(), low.root()]);
    let pinned = Coordinate::parse("io.quarkus:quarkus-core:1.0")?;
    let other = Coordinate::parse("io.quarkus:quarkus-core:2.0")?;
    let found = resolver.resolve(&[pinned.clone(), other.clone()], &[RecipeKind::SCM]).await?;

    assert_eq!(found[&pinned][&RecipeKind::SCM], version_override);
    assert_eq!(found[&other][&RecipeKind::SCM], high.level_dir("io.quarkus", None, None).join("scm.yaml"));
    Ok(())
}

#[tokio::test]
async fn test_redirect_to_other_artifact() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    let target = db.scm("org.acme", Some("core"), None, &ScmRecipeFixture::uri("https://github.com/acme/core"))?;
    db.scm("org.acme", None, None, &ScmRecipeFixture::uri("https://github.com/acme/everything"))?;
    db.redirect(&db.level_dir("org.acme", Some("core-jakarta"), None), None, Some("core"), None)?;

    let resolver = layered(&[db.root()]);
    let info = resolver.resolve_scm_info(&Coordinate::parse("org.acme:core-jakarta:3.1")?).await?;
    assert_eq!(info.map(|i| i.repository.uri), Some("https://github.com/acme/core".to_string()));

    let found = resolver.resolve(&[Coordinate::parse("org.acme:core-jakarta:3.1")?], &[RecipeKind::SCM]).await?;
    assert_eq!(found.values().next().and_then(|m| m.get(&RecipeKind::SCM)), Some(&target));
    Ok(())
}

#[tokio::test]
async fn test_redirect_cycle_is_an_error() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    db.scm("org.loop", None, None, &ScmRecipeFixture::uri("https://example.org/loop"))?;
    db.redirect(&db.level_dir("org.loop", None, Some("1")), None, None, Some("2"))?;
    db.redirect(&db.level_dir("org.loop", None, Some("2")), None, None, Some("1"))?;

    let resolver = layered(&[db.root()]);
    let err = resolver.resolve(&[Coordinate::parse("org.loop:a:1")?], &[RecipeKind::SCM]).await.unwrap_err();
    let cycle = err.chain().find_map(|e| e.downcast_ref::<RecipeError>());
    assert!(matches!(cycle, Some(RecipeError::RedirectCycle { .. })), "unexpected error: {err:#}");
    Ok(())
}

#[tokio::test]
async fn test_invalid_recipe_is_treated_as_missing() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    db.scm("org.broken", None, None, &ScmRecipeFixture::invalid())?;

    let resolver = layered(&[db.root()]);
    assert!(resolver.resolve_scm_info(&Coordinate::parse("org.broken:a:1")?).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_build_info_by_repository() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    db.build_info("github.com/quarkusio/quarkus", "build.yaml", "enforceVersion: true\njavaVersion: \"17\"\n")?;

    let resolver = layered(&[db.root()]);
    let recipe = resolver.resolve_build_recipe("https://github.com/quarkusio/quarkus.git").await?;
    assert_eq!(
        recipe,
        Some(BuildRecipeInfo {
            enforce_version: true,
            java_version: Some("17".to_string()),
            ..BuildRecipeInfo::default()
        })
    );
    assert!(resolver.resolve_build_recipe("https://github.com/other/repo").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_git_database_is_cloned_and_refreshed() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let origin = ws.database_repo("db-origin", &[("scm-info/io/acme/scm.yaml", "uri: https://github.com/acme/acme\n")])?;

    let config = ResolverConfig::builder()
        .recipe_repos([format!("{}#main", origin.file_url())])
        .update_interval(Duration::ZERO)
        .checkout_dir(ws.path().join("checkouts"))
        .build();
    let resolver = RecipeResolver::from_config(&config).await?;

    let acme = Coordinate::parse("io.acme:widget:1.0")?;
    assert!(resolver.resolve_scm_info(&acme).await?.is_some());

    let newcomer = Coordinate::parse("io.newcomer:thing:1.0")?;
    assert!(resolver.resolve_scm_info(&newcomer).await?.is_none());

    origin.commit_file("scm-info/io/newcomer/scm.yaml", "uri: https://github.com/new/thing\n", "Add newcomer")?;
    let info = resolver.resolve_scm_info(&newcomer).await?;
    assert_eq!(info.map(|i| i.repository.uri), Some("https://github.com/new/thing".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_existing_checkout_is_reused() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let origin = ws.database_repo("db-origin", &[("scm-info/io/acme/scm.yaml", "uri: https://github.com/acme/acme\n")])?;
    let config = ResolverConfig::builder()
        .recipe_repos([origin.file_url()])
        .checkout_dir(ws.path().join("checkouts"))
        .build();

    drop(RecipeResolver::from_config(&config).await?);
    let reopened = RecipeResolver::from_config(&config).await?;
    assert_eq!(reopened.sources().len(), 1);
    assert!(reopened.resolve_scm_info(&Coordinate::parse("io.acme:a:1")?).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_reused_checkout_is_brought_up_to_date() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let origin = ws.database_repo("db-origin", &[("scm-info/io/acme/scm.yaml", "uri: https://github.com/acme/acme\n")])?;
    let config = ResolverConfig::builder()
        .recipe_repos([origin.file_url()])
        .update_interval(Duration::from_secs(3600))
        .checkout_dir(ws.path().join("checkouts"))
        .build();
    drop(RecipeResolver::from_config(&config).await?);

    origin.commit_file("scm-info/io/newcomer/scm.yaml", "uri: https://github.com/new/thing\n", "Add newcomer")?;
    let reopened = RecipeResolver::from_config(&config).await?;
    let info = reopened.resolve_scm_info(&Coordinate::parse("io.newcomer:thing:1.0")?).await?;
    assert_eq!(info.map(|i| i.repository.uri), Some("https://github.com/new/thing".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_local_directories_precede_repositories() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let origin = ws.database_repo("db-origin", &[("scm-info/io/acme/scm.yaml", "uri: https://github.com/acme/remote\n")])?;
    let local = ws.database("local");
    local.scm("io.acme", None, None, &ScmRecipeFixture::uri("https://github.com/acme/local"))?;

    let config = ResolverConfig::builder()
        .recipe_repos([origin.file_url()])
        .local_recipe_dir(local.root())
        .checkout_dir(ws.path().join("checkouts"))
        .build();
    let resolver = RecipeResolver::from_config(&config).await?;
    let info = resolver.resolve_scm_info(&Coordinate::parse("io.acme:a:1")?).await?;
    assert_eq!(info.map(|i| i.repository.uri), Some("https://github.com/acme/local".to_string()));
    Ok(())
}
