//! Provider detection and URL composition.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::errors::RepolinkError;
use crate::domain::model::{LineRange, Provider};

static GITHUB_REMOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:git@github\.com:|https://(?:[^@/\s]+@)?github\.com/)(?P<repo>.*)$")
        .expect("github remote pattern")
});

// Credentials and account subdomains in front of the host are dropped.
static BITBUCKET_REMOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:git@bitbucket\.org:|https://(?:[^@/\s]+@)?(?:[a-z0-9-]+\.)*bitbucket\.org/)(?P<repo>.*)$",
    )
    .expect("bitbucket remote pattern")
});

static REPO_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^/\s]+/[^/\s]+$").expect("repository path pattern"));

impl Provider {
    /// Classify a remote URL, returning `None` for hosts other than GitHub and Bitbucket.
    pub fn classify(remote_url: &str) -> Option<Provider> {
        let remote_url = remote_url.trim();
        if GITHUB_REMOTE.is_match(remote_url) {
            Some(Provider::GitHub)
        } else if BITBUCKET_REMOTE.is_match(remote_url) {
            Some(Provider::Bitbucket)
        } else {
            None
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Provider::GitHub => &GITHUB_REMOTE,
            Provider::Bitbucket => &BITBUCKET_REMOTE,
        }
    }
}

/// Remote rewritten to the HTTPS page of the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRemote {
    pub provider: Provider,
    pub url: String,
}

/// Rewrite an SSH or HTTPS remote into `https://<host>/<owner>/<repo>`.
///
/// Already normalized URLs come back unchanged.
pub fn normalize_remote(remote_url: &str) -> Result<NormalizedRemote, RepolinkError> {
    let trimmed = remote_url.trim();
    let provider =
        Provider::classify(trimmed).ok_or_else(|| RepolinkError::UnsupportedProvider {
            url: remote_url.to_owned(),
        })?;

    let malformed = || RepolinkError::MalformedRemoteUrl {
        url: remote_url.to_owned(),
    };
    let captures = provider.pattern().captures(trimmed).ok_or_else(malformed)?;
    let repo = captures.name("repo").map_or("", |m| m.as_str());
    let repo = repo.trim_end_matches('/');
    let repo = strip_git_suffix(repo);

    if !REPO_PATH.is_match(repo) {
        return Err(malformed());
    }

    Ok(NormalizedRemote {
        provider,
        url: format!("{}/{repo}", provider.host()),
    })
}

fn strip_git_suffix(repo: &str) -> &str {
    let split = repo.len().saturating_sub(4);
    match repo.get(split..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(".git") => &repo[..split],
        _ => repo,
    }
}

/// Build the browsing URL for `file_path` on `branch`.
pub fn build_link(
    remote_url: &str,
    branch: &str,
    file_path: &str,
    lines: Option<LineRange>,
) -> Result<String, RepolinkError> {
    let remote = normalize_remote(remote_url)?;
    Ok(compose_link(&remote, branch, file_path, lines))
}

/// Append the provider's file path and line anchor to an already normalized remote.
pub fn compose_link(
    remote: &NormalizedRemote,
    branch: &str,
    file_path: &str,
    lines: Option<LineRange>,
) -> String {
    let NormalizedRemote { provider, url } = remote;
    let file_path = file_path.trim_start_matches('/');

    let link = match provider {
        Provider::GitHub => format!("{url}/blob/{branch}/{file_path}"),
        Provider::Bitbucket => format!("{url}/src/{branch}/{file_path}"),
    };

    match lines {
        Some(range) => format!("{link}#{}", line_anchor(*provider, file_path, range)),
        None => link,
    }
}

fn line_anchor(provider: Provider, file_path: &str, range: LineRange) -> String {
    match provider {
        Provider::GitHub => format!("L{}-L{}", range.start(), range.end()),
        Provider::Bitbucket => {
            let basename = file_path.rsplit('/').next().unwrap_or(file_path);
            format!("{basename}-{}:{}", range.start(), range.end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(start: usize, end: usize) -> Option<LineRange> {
        Some(LineRange::new(start, end).unwrap())
    }

    #[test]
    fn github_ssh_without_range() {
        let link = build_link("git@github.com:john2x/repolink.git", "master", "repolink.el", None);
        assert_eq!(
            link.unwrap(),
            "https://github.com/john2x/repolink/blob/master/repolink.el"
        );
    }

    #[test]
    fn github_ssh_with_range() {
        let link = build_link(
            "git@github.com:john2x/repolink.git",
            "master",
            "repolink.el",
            lines(10, 20),
        );
        assert_eq!(
            link.unwrap(),
            "https://github.com/john2x/repolink/blob/master/repolink.el#L10-L20"
        );
    }

    #[test]
    fn bitbucket_ssh_with_range_uses_basename_anchor() {
        let link = build_link("git@bitbucket.org:team/proj.git", "dev", "src/main.py", lines(3, 3));
        assert_eq!(
            link.unwrap(),
            "https://bitbucket.org/team/proj/src/dev/src/main.py#main.py-3:3"
        );
    }

    #[test]
    fn unsupported_provider_is_reported() {
        let err = build_link("git@gitlab.com:x/y.git", "main", "README.md", None).unwrap_err();
        assert_eq!(
            err,
            RepolinkError::UnsupportedProvider {
                url: "git@gitlab.com:x/y.git".into()
            }
        );
        assert_eq!(Provider::classify("https://gitlab.com/x/y"), None);
    }

    #[test]
    fn every_supported_shape_normalizes_to_canonical_host() {
        let cases = [
            ("git@github.com:owner/repo.git", "https://github.com/owner/repo"),
            ("git@github.com:owner/repo", "https://github.com/owner/repo"),
            ("https://github.com/owner/repo.git", "https://github.com/owner/repo"),
            ("https://GitHub.com/owner/repo/", "https://github.com/owner/repo"),
            ("git@bitbucket.org:team/proj.git", "https://bitbucket.org/team/proj"),
            ("https://bitbucket.org/team/proj", "https://bitbucket.org/team/proj"),
            (
                "https://jane@bitbucket.org/team/proj.git",
                "https://bitbucket.org/team/proj",
            ),
            (
                "https://acme.bitbucket.org/team/proj.git",
                "https://bitbucket.org/team/proj",
            ),
            ("GIT@BITBUCKET.ORG:team/proj.git", "https://bitbucket.org/team/proj"),
        ];

        for (input, expected) in cases {
            let normalized = normalize_remote(input).unwrap();
            assert_eq!(normalized.url, expected, "input: {input}");
        }
    }

    #[test]
    fn normalizing_is_idempotent() {
        for url in ["https://github.com/owner/repo", "https://bitbucket.org/team/proj"] {
            let once = normalize_remote(url).unwrap().url;
            assert_eq!(once, url);
            assert_eq!(normalize_remote(&once).unwrap().url, once);
        }
    }

    #[test]
    fn remote_without_owner_is_malformed() {
        for url in ["git@github.com:repo.git", "https://github.com/", "git@bitbucket.org:a/b/c"] {
            assert!(
                matches!(
                    normalize_remote(url),
                    Err(RepolinkError::MalformedRemoteUrl { .. })
                ),
                "input: {url}"
            );
        }
    }

    #[test]
    fn git_suffix_is_stripped_in_any_case() {
        for url in ["https://github.com/o/r.GIT", "git@github.com:o/r.Git", "git@github.com:o/r.git/"] {
            assert_eq!(normalize_remote(url).unwrap().url, "https://github.com/o/r", "input: {url}");
        }
        // Only a trailing suffix goes.
        assert_eq!(
            normalize_remote("https://github.com/o/r.github").unwrap().url,
            "https://github.com/o/r.github"
        );
    }

    #[test]
    fn compose_reuses_normalized_remote() {
        let remote = normalize_remote("git@bitbucket.org:team/proj.git").unwrap();
        let lines = lines(3, 7);
        assert_eq!(
            compose_link(&remote, "dev", "src/main.py", lines),
            build_link("git@bitbucket.org:team/proj.git", "dev", "src/main.py", lines).unwrap()
        );
    }

    #[test]
    fn nested_path_keeps_forward_slashes() {
        let link = build_link("https://github.com/o/r", "main", "/a/b/c.rs", lines(1, 2)).unwrap();
        assert_eq!(link, "https://github.com/o/r/blob/main/a/b/c.rs#L1-L2");
    }
}
