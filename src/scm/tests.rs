use super::*;
use crate::store::RecipeLayout;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[derive(Default)]
struct FakeTags {
    repos: HashMap<String, HashMap<String, String>>,
    /// URIs whose listing fails as if git were missing
    without_git: Vec<String>,
    calls: AtomicUsize,
}

impl FakeTags {
    fn repo(mut self, uri: &str, tags: &[(&str, &str)]) -> Self {
        self.repos.insert(
            uri.to_string(),
            tags.iter().map(|(t, h)| ((*t).to_string(), (*h).to_string())).collect(),
        );
        self
    }

    fn git_missing_for(mut self, uri: &str) -> Self {
        self.without_git.push(uri.to_string());
        self
    }
}

impl TagSource for FakeTags {
    async fn list_tags(&self, uri: &str) -> Result<HashMap<String, String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.without_git.iter().any(|u| u == uri) {
            return Err(RecipeError::GitNotFound.into());
        }
        self.repos.get(uri).cloned().ok_or_else(|| {
            RecipeError::GitCommandError {
                operation: format!("ls-remote {uri}"),
                stderr: "repository not found".to_string(),
            }
            .into()
        })
    }
}

#[derive(Default)]
struct FakePoms {
    poms: HashMap<Coordinate, Pom>,
    fetched: Mutex<Vec<Coordinate>>,
}

impl FakePoms {
    fn scm(mut self, gav: &str, connection: &str) -> Self {
        let pom = Pom {
            scm: Some(PomScm {
                connection: Some(connection.to_string()),
                url: None,
            }),
            ..Pom::default()
        };
        self.poms.insert(Coordinate::parse(gav).unwrap(), pom);
        self
    }

    fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

impl PomSource for FakePoms {
    async fn fetch_pom(&self, coordinate: &Coordinate) -> Result<Option<Pom>> {
        self.fetched.lock().unwrap().push(coordinate.clone());
        Ok(self.poms.get(coordinate).cloned())
    }
}

struct Fixture {
    _db: TempDir,
    layout: RecipeLayout,
}

impl Fixture {
    fn new() -> Self {
        let db = TempDir::new().unwrap();
        let layout = RecipeLayout::open(db.path());
        Self {
            _db: db,
            layout,
        }
    }

    fn scm(self, group: &str, info: &ScmInfo) -> Self {
        self.layout.write_recipe(group, None, None, info).unwrap();
        self
    }

    fn resolver<T: TagSource, P: PomSource>(&self, tags: T, poms: P) -> ScmTagResolver<T, P> {
        let recipes = RecipeResolver::new(vec![Arc::new(self.layout.clone())]);
        ScmTagResolver::new(Arc::new(recipes), tags, poms)
    }
}

fn recipe_error(err: &anyhow::Error) -> &RecipeError {
    err.downcast_ref::<RecipeError>().unwrap_or_else(|| panic!("not a RecipeError: {err:#}"))
}

#[tokio::test]
async fn test_resolves_tag_from_recipe() {
    let fixture = Fixture::new().scm("com.example", &ScmInfo::new("https://github.com/example/foo"));
    let tags = FakeTags::default().repo("https://github.com/example/foo", &[("v2.1.0", "abc123"), ("v2.0.0", "000")]);
    let resolver = fixture.resolver(tags, FakePoms::default());

    let info = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "2.1.0")).await.unwrap();
    assert_eq!(info.tag, "v2.1.0");
    assert_eq!(info.hash.as_deref(), Some("abc123"));
    assert_eq!(info.repo.uri, "https://github.com/example/foo");
}

#[tokio::test]
async fn test_legacy_repository_used_when_primary_has_no_tag() {
    let mut scm = ScmInfo::new("https://github.com/example/new");
    scm.legacy_repos.push(RepositoryInfo::git("https://github.com/example/old"));
    let fixture = Fixture::new().scm("com.example", &scm);
    let tags = FakeTags::default()
        .repo("https://github.com/example/new", &[("3.0.0", "new")])
        .repo("https://github.com/example/old", &[("1.5.0", "old")]);
    let resolver = fixture.resolver(tags, FakePoms::default());

    let info = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "1.5.0")).await.unwrap();
    assert_eq!(info.repo.uri, "https://github.com/example/old");
    assert_eq!(info.hash.as_deref(), Some("old"));
}

#[tokio::test]
async fn test_unreachable_primary_falls_through_to_legacy() {
    let mut scm = ScmInfo::new("https://github.com/example/gone");
    scm.legacy_repos.push(RepositoryInfo::git("https://github.com/example/old"));
    let fixture = Fixture::new().scm("com.example", &scm);
    let tags = FakeTags::default().repo("https://github.com/example/old", &[("1.0", "h")]);
    let resolver = fixture.resolver(tags, FakePoms::default());

    let info = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "1.0")).await.unwrap();
    assert_eq!(info.repo.uri, "https://github.com/example/old");
}

#[tokio::test]
async fn test_non_candidate_failure_stops_search() {
    let mut scm = ScmInfo::new("https://github.com/example/new");
    scm.legacy_repos.push(RepositoryInfo::git("https://github.com/example/old"));
    let fixture = Fixture::new().scm("com.example", &scm);
    let tags = FakeTags::default()
        .git_missing_for("https://github.com/example/new")
        .repo("https://github.com/example/old", &[("1.0", "h")]);
    let resolver = fixture.resolver(tags, FakePoms::default());

    let err = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "1.0")).await.unwrap_err();
    assert!(matches!(recipe_error(&err), RecipeError::GitNotFound));
    assert_eq!(resolver.tag_source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_first_failure_is_reported() {
    let mut scm = ScmInfo::new("https://github.com/example/new");
    scm.legacy_repos.push(RepositoryInfo::git("https://github.com/example/old"));
    let fixture = Fixture::new().scm("com.example", &scm);
    let tags = FakeTags::default()
        .repo("https://github.com/example/new", &[("a-1.0", "1"), ("b-1.0", "2")])
        .repo("https://github.com/example/old", &[]);
    let resolver = fixture.resolver(tags, FakePoms::default());

    let err = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "1.0")).await.unwrap_err();
    assert!(matches!(recipe_error(&err), RecipeError::AmbiguousTag { .. }));
}

#[tokio::test]
async fn test_mappings_from_all_repositories_apply_everywhere() {
    let mut legacy = RepositoryInfo::git("https://github.com/example/old");
    legacy.tag_mapping.push(TagMapping::new(r"(\d+)\.(\d+)", "release_$1_$2"));
    let mut scm = ScmInfo::new("https://github.com/example/new");
    scm.legacy_repos.push(legacy);
    let fixture = Fixture::new().scm("com.example", &scm);
    let tags = FakeTags::default()
        .repo("https://github.com/example/new", &[("release_4_2", "mapped"), ("4.2", "plain")])
        .repo("https://github.com/example/old", &[]);
    let resolver = fixture.resolver(tags, FakePoms::default());

    let info = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "4.2")).await.unwrap();
    assert_eq!(info.tag, "release_4_2");
    assert_eq!(info.repo.uri, "https://github.com/example/new");
}

#[tokio::test]
async fn test_explicit_ref_mapping_has_no_hash() {
    let mut scm = ScmInfo::new("https://github.com/example/foo");
    scm.repository.tag_mapping.push(TagMapping::new("1.0.0", "0123abcd"));
    let fixture = Fixture::new().scm("com.example", &scm);
    let tags = FakeTags::default().repo("https://github.com/example/foo", &[("1.0.0", "tagged")]);
    let resolver = fixture.resolver(tags, FakePoms::default());

    let info = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "1.0.0")).await.unwrap();
    assert_eq!(info.tag, "0123abcd");
    assert_eq!(info.hash, None);
}

#[tokio::test]
async fn test_pom_discovery_without_recipe() {
    let fixture = Fixture::new();
    let tags = FakeTags::default().repo("https://github.com/example/foo", &[("foo-2.1.0", "pomhash")]);
    let poms = FakePoms::default().scm("com.example:foo:2.1.0", "scm:git:git@github.com:example/foo.git");
    let resolver = fixture.resolver(tags, poms);

    let info = resolver.resolve_tag_info(&Coordinate::new("com.example", "foo", "2.1.0")).await.unwrap();
    assert_eq!(info.tag, "foo-2.1.0");
    assert_eq!(info.repo.uri, "https://github.com/example/foo");
}

#[tokio::test]
async fn test_pom_not_consulted_when_recipe_exists() {
    let fixture = Fixture::new().scm("com.example", &ScmInfo::new("https://github.com/example/foo"));
    let tags = FakeTags::default()
        .repo("https://github.com/example/foo", &[])
        .repo("https://github.com/example/pom", &[("1.0", "h")]);
    let poms = FakePoms::default().scm("com.example:foo:1.0", "scm:git:https://github.com/example/pom");
    let resolver = fixture.resolver(tags, poms);

    let coordinate = Coordinate::new("com.example", "foo", "1.0");
    let err = resolver.resolve_tag_info(&coordinate).await.unwrap_err();
    assert!(matches!(recipe_error(&err), RecipeError::NoMatchingTag { .. }));
    assert_eq!(resolver.pom_source.fetch_count(), 0);
}

#[tokio::test]
async fn test_recipe_with_only_empty_uris_falls_back_to_pom() {
    let fixture = Fixture::new().scm("com.example", &ScmInfo::new(""));
    let tags = FakeTags::default().repo("https://github.com/example/foo", &[("1.0", "h")]);
    let poms = FakePoms::default().scm("com.example:foo:1.0", "scm:git:https://github.com/example/foo.git");
    let resolver = fixture.resolver(tags, poms);

    let (strategy, info) = resolver.discover(&Coordinate::new("com.example", "foo", "1.0")).await.unwrap().unwrap();
    assert_eq!(strategy, ScmStrategy::PomDiscovery);
    assert_eq!(info.uri(), "https://github.com/example/foo");
}

#[tokio::test]
async fn test_scm_not_found() {
    let resolver = Fixture::new().resolver(FakeTags::default(), FakePoms::default());
    let err = resolver.resolve_tag_info(&Coordinate::new("org.nowhere", "x", "1")).await.unwrap_err();
    assert!(matches!(recipe_error(&err), RecipeError::ScmNotFound { .. }));
}

#[tokio::test]
async fn test_strategies_can_be_restricted() {
    let fixture = Fixture::new();
    let poms = FakePoms::default().scm("g:a:1", "scm:git:https://github.com/g/a");
    let resolver = fixture.resolver(FakeTags::default(), poms).with_strategies(vec![ScmStrategy::Recipe]);

    assert!(resolver.discover(&Coordinate::new("g", "a", "1")).await.unwrap().is_none());
    assert_eq!(resolver.pom_source.fetch_count(), 0);
}

#[tokio::test]
async fn test_tag_cache_reuses_listing() {
    let fixture = Fixture::new().scm("com.example", &ScmInfo::new("https://github.com/example/foo"));
    let listing: &[(&str, &str)] = &[("1.0", "a"), ("2.0", "b")];

    let cached = fixture
        .resolver(FakeTags::default().repo("https://github.com/example/foo", listing), FakePoms::default())
        .with_tag_cache(true);
    cached.resolve_tag_info(&Coordinate::new("com.example", "foo", "1.0")).await.unwrap();
    cached.resolve_tag_info(&Coordinate::new("com.example", "bar", "2.0")).await.unwrap();
    assert_eq!(cached.tag_source.calls.load(Ordering::SeqCst), 1);

    let uncached =
        fixture.resolver(FakeTags::default().repo("https://github.com/example/foo", listing), FakePoms::default());
    uncached.resolve_tag_info(&Coordinate::new("com.example", "foo", "1.0")).await.unwrap();
    uncached.resolve_tag_info(&Coordinate::new("com.example", "bar", "2.0")).await.unwrap();
    assert_eq!(uncached.tag_source.calls.load(Ordering::SeqCst), 2);
}
