use anyhow::Result;
use predicates::prelude::*;
use recipedb_cli::test_utils::ScmRecipeFixture;

use crate::common::TestWorkspace;

#[test]
fn test_lookup_recipes_text() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    let scm = db.scm("io.acme", None, None, &ScmRecipeFixture::uri("https://github.com/acme/acme"))?;

    ws.recipedb()
        .arg("--recipes")
        .arg(db.root())
        .args(["lookup-recipes", "io.acme:widget:1.0", "org.other:thing:2.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("io.acme:widget:1.0\tscm\t{}", scm.display())))
        .stdout(predicate::str::contains("org.other:thing:2.0\t-\t-"));
    Ok(())
}

#[test]
fn test_lookup_recipes_json() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    let scm = db.scm("io.acme", Some("widget"), None, &ScmRecipeFixture::uri("https://github.com/acme/widget"))?;

    let output = ws
        .recipedb()
        .arg("--recipes")
        .arg(db.root())
        .args(["lookup-recipes", "--kind", "scm", "--format", "json", "io.acme:widget:1.0"])
        .output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["io.acme:widget:1.0"]["scm"], scm.display().to_string());
    Ok(())
}

#[test]
fn test_add_scm_then_lookup() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");

    ws.recipedb()
        .arg("--recipes")
        .arg(db.root())
        .args(["add-scm", "io.acme:widget:1.0", "--uri", "https://github.com/acme/widget", "--group"])
        .args(["--tag-mapping", r"(.*)\.Final=v$1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = db.level_dir("io.acme", None, None).join("scm.yaml");
    let content = std::fs::read_to_string(&written)?;
    assert!(content.contains("https://github.com/acme/widget"));
    assert!(content.contains("v$1"));

    ws.recipedb()
        .arg("--recipes")
        .arg(db.root())
        .args(["lookup-recipes", "--kind", "scm", "io.acme:other:2.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(written.display().to_string()));
    Ok(())
}

#[test]
fn test_add_scm_requires_recipe_directory() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.recipedb()
        .args(["add-scm", "io.acme:widget:1.0", "--uri", "https://github.com/acme/widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--recipes"));
    Ok(())
}

#[test]
fn test_lookup_scm_json_against_local_repository() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let source = ws.source_repo("widget", &["widget-1.2.0", "1.1.0"])?;
    let db = ws.database("db");
    db.scm("io.acme", None, None, &ScmRecipeFixture::uri(&source.file_url()))?;

    let output = ws
        .recipedb()
        .arg("--recipes")
        .arg(db.root())
        .args(["lookup-scm", "--format", "json", "io.acme:widget:1.2.0"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let first = &json[0];
    assert_eq!(first["coordinate"], "io.acme:widget:1.2.0");
    assert_eq!(first["tag"], "widget-1.2.0");
    assert_eq!(first["hash"], source.get_commit_hash()?);
    assert_eq!(first["repo"]["uri"], source.file_url());
    Ok(())
}

#[test]
fn test_lookup_scm_text_reports_failures() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let source = ws.source_repo("widget", &["1.0.0"])?;
    let db = ws.database("db");
    db.scm("io.acme", None, None, &ScmRecipeFixture::uri(&source.file_url()))?;

    ws.recipedb()
        .arg("--recipes")
        .arg(db.root())
        .args(["lookup-scm", "io.acme:widget:1.0.0", "io.acme:widget:7.0.0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(format!("io.acme:widget:1.0.0\t{}\t1.0.0\t", source.file_url())))
        .stderr(predicate::str::contains("Could not determine tag for 7.0.0"))
        .stderr(predicate::str::contains("1 of 2 coordinates could not be resolved"));
    Ok(())
}

#[test]
fn test_invalid_coordinate_fails() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let db = ws.database("db");
    std::fs::create_dir_all(db.root())?;

    ws.recipedb()
        .arg("--recipes")
        .arg(db.root())
        .args(["lookup-recipes", "not-a-coordinate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a valid coordinate"));
    Ok(())
}
