//! Conversion of Maven SCM coordinates into browsable HTTPS origins.

const SCM_PREFIXES: [&str; 6] = ["scm:", "git:", "svn:", "ssh:", "git@", "//"];

/// Converts an SCM connection string or URL into an `https://` URL.
///
/// Strips `scm:`/`git:`/`svn:`/`ssh:` provider prefixes and `git@` user parts,
/// turns the scp-like `host:path` form into `host/path`, upgrades `http://` and
/// drops a trailing `.git`. GitHub URLs are truncated to `owner/repo`.
///
/// ```rust
/// use recipedb_cli::scm::scm_to_https;
///
/// assert_eq!(scm_to_https("scm:git:git@github.com:org/repo.git"), "https://github.com/org/repo");
/// assert_eq!(scm_to_https("https://github.com/org/repo/tree/main/core"), "https://github.com/org/repo");
/// ```
#[must_use]
pub fn scm_to_https(scm: &str) -> String {
    let mut rest = scm.trim();
    while let Some(stripped) = SCM_PREFIXES.iter().find_map(|p| rest.strip_prefix(p)) {
        rest = stripped;
    }

    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest).trim_end_matches('/');

    let url = if let Some(path) = rest.strip_prefix("http://") {
        format!("https://{path}")
    } else if rest.contains("://") {
        rest.to_string()
    } else {
        format!("https://{}", rest.replacen(':', "/", 1))
    };

    match url.strip_prefix("https://github.com/") {
        Some(path) => {
            let mut parts = path.split('/').filter(|p| !p.is_empty());
            match (parts.next(), parts.next()) {
                (Some(owner), Some(repo)) => {
                    let repo = repo.strip_suffix(".git").unwrap_or(repo);
                    format!("https://github.com/{owner}/{repo}")
                }
                _ => url,
            }
        }
        None => url,
    }
}
