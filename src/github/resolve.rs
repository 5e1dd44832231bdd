// src/github/resolve.rs
// =============================================================================
// This module turns a browsable GitHub URL into a contents API query.
//
// Example:
//   https://github.com/rust-lang/rust/tree/master/src/doc
//     -> https://api.github.com/repos/rust-lang/rust/contents/src/doc?ref=master
//        plus the relative path "src/doc"
//
// No network access happens here, so a bad URL is rejected before any
// request is made.
// =============================================================================

use url::Url;

use crate::error::{Error, InvalidReason, Result};

// API base for repositories hosted on github.com itself
pub const GITHUB_API_BASE: &str = "https://api.github.com/repos";

/// A parsed browsable URL: which repository, which ref, which path inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    pub scheme: String,
    /// Host plus optional port, e.g. "github.com" or "git.example.com:8443"
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    /// Slash-separated path relative to the repository root, never empty
    pub path: String,
}

/// The machine-readable URL for a directory listing, pinned to a ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEndpoint {
    pub url: String,
    pub git_ref: String,
}

impl ListingEndpoint {
    pub fn new(url: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            git_ref: git_ref.into(),
        }
    }
}

impl RepositoryReference {
    // Picks the API base: explicit override, then github.com, then the
    // GitHub Enterprise layout (<host>/api/v3) for any other host
    pub fn api_base(&self, api_override: Option<&str>) -> String {
        if let Some(base) = api_override {
            return base.trim_end_matches('/').to_string();
        }
        match self.host.as_str() {
            "github.com" | "www.github.com" => GITHUB_API_BASE.to_string(),
            host => format!("{}://{}/api/v3/repos", self.scheme, host),
        }
    }

    pub fn listing_endpoint(&self, api_override: Option<&str>) -> ListingEndpoint {
        // Each path segment is encoded on its own so the slashes survive
        let encoded_path = self
            .path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let url = format!(
            "{}/{}/{}/contents/{}?ref={}",
            self.api_base(api_override),
            self.owner,
            self.repo,
            encoded_path,
            urlencoding::encode(&self.git_ref)
        );

        ListingEndpoint::new(url, self.git_ref.clone())
    }
}

// Resolves a browsable URL against the default API host
//
// Returns: (listing endpoint, relative path inside the repository)
pub fn resolve(input: &str) -> Result<(ListingEndpoint, String)> {
    resolve_with_api(input, None)
}

pub fn resolve_with_api(input: &str, api_override: Option<&str>) -> Result<(ListingEndpoint, String)> {
    let reference = parse_reference(input)?;
    let endpoint = reference.listing_endpoint(api_override);
    Ok((endpoint, reference.path))
}

// Parses a browsable URL of the shape
//   https://<host>/<owner>/<repo>/(tree|blob)/<ref>/<path...>
//
// The first tree/blob segment after owner/repo is the delimiter and the
// segment right after it is the ref. Refs containing '/' can't be told
// apart from the path, so they are not supported.
pub fn parse_reference(input: &str) -> Result<RepositoryReference> {
    let trimmed = input.trim();

    let url = Url::parse(trimmed).map_err(|_| Error::invalid(trimmed, InvalidReason::Malformed))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::invalid(trimmed, InvalidReason::Malformed));
    }

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => return Err(Error::invalid(trimmed, InvalidReason::Malformed)),
    };

    // path_segments() drops the query and fragment for us; empty segments
    // come from doubled or trailing slashes
    let segments: Vec<&str> = url
        .path_segments()
        .map(|parts| parts.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(Error::invalid(trimmed, InvalidReason::Malformed));
    }

    let owner = decode(segments[0]);
    let repo = decode(segments[1]);
    let repo = repo.strip_suffix(".git").unwrap_or(&repo).to_string();

    let delimiter = segments
        .iter()
        .skip(2)
        .position(|s| *s == "tree" || *s == "blob")
        .map(|i| i + 2);

    let Some(delimiter) = delimiter else {
        // owner/repo with nothing after it is the whole repository
        let reason = if segments.len() == 2 {
            InvalidReason::RepositoryRoot
        } else {
            InvalidReason::MissingBranch
        };
        return Err(Error::invalid(trimmed, reason));
    };

    let Some(git_ref) = segments.get(delimiter + 1) else {
        return Err(Error::invalid(trimmed, InvalidReason::MissingBranch));
    };

    let rest = &segments[delimiter + 2..];
    if rest.is_empty() {
        // A branch with no path is still the whole repository
        return Err(Error::invalid(trimmed, InvalidReason::RepositoryRoot));
    }

    let path = rest.iter().map(|s| decode(s)).collect::<Vec<_>>().join("/");

    Ok(RepositoryReference {
        scheme: url.scheme().to_string(),
        host,
        owner,
        repo,
        git_ref: decode(git_ref),
        path,
    })
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ref_param(endpoint: &ListingEndpoint) -> String {
        let url = Url::parse(&endpoint.url).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "ref")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_resolve_tree_url() {
        let (endpoint, path) =
            resolve("https://github.com/rust-lang/rust/tree/master/src/doc").unwrap();
        assert_eq!(
            endpoint.url,
            "https://api.github.com/repos/rust-lang/rust/contents/src/doc?ref=master"
        );
        assert_eq!(endpoint.git_ref, "master");
        assert_eq!(ref_param(&endpoint), "master");
        assert_eq!(path, "src/doc");
    }

    #[test]
    fn test_resolve_blob_url() {
        let (endpoint, path) =
            resolve("https://github.com/user/repo/blob/v1.2.0/docs/guide/intro.md").unwrap();
        assert_eq!(ref_param(&endpoint), "v1.2.0");
        assert_eq!(path, "docs/guide/intro.md");
        assert!(endpoint
            .url
            .starts_with("https://api.github.com/repos/user/repo/contents/docs/guide/intro.md"));
    }

    #[test]
    fn test_ref_and_path_match_for_many_urls() {
        let cases = [
            ("main", "a"),
            ("develop", "a/b/c"),
            ("0.1.x", "crates/core/src"),
            ("3f2a9c1", "README.md"),
        ];
        for (git_ref, rel) in cases {
            let url = format!("https://github.com/owner/name/tree/{}/{}", git_ref, rel);
            let (endpoint, path) = resolve(&url).unwrap();
            assert_eq!(ref_param(&endpoint), git_ref, "ref for {}", url);
            assert_eq!(path, rel, "path for {}", url);
        }
    }

    #[test]
    fn test_trailing_slash_query_and_fragment_are_ignored() {
        let (endpoint, path) =
            resolve("https://github.com/user/repo/tree/main/docs/?tab=readme#top").unwrap();
        assert_eq!(path, "docs");
        assert_eq!(
            endpoint.url,
            "https://api.github.com/repos/user/repo/contents/docs?ref=main"
        );
    }

    #[test]
    fn test_percent_escapes_are_decoded_in_path() {
        let (endpoint, path) =
            resolve("https://github.com/user/repo/tree/main/my%20docs/notes").unwrap();
        assert_eq!(path, "my docs/notes");
        assert!(endpoint.url.contains("/contents/my%20docs/notes?"));
    }

    #[test]
    fn test_bare_repository_is_refused() {
        for url in [
            "https://github.com/user/repo",
            "https://github.com/user/repo/",
            "https://github.com/user/repo.git",
            "https://github.com/user/repo/tree/main",
        ] {
            match resolve(url) {
                Err(Error::InvalidReference { reason, .. }) => {
                    assert_eq!(reason, InvalidReason::RepositoryRoot, "{}", url)
                }
                other => panic!("expected refusal for {}, got {:?}", url, other),
            }
        }
    }

    #[test]
    fn test_missing_branch_segment() {
        for url in [
            "https://github.com/user/repo/issues/12",
            "https://github.com/user/repo/tree",
        ] {
            match resolve(url) {
                Err(Error::InvalidReference { reason, .. }) => {
                    assert_eq!(reason, InvalidReason::MissingBranch, "{}", url)
                }
                other => panic!("expected missing branch for {}, got {:?}", url, other),
            }
        }
    }

    #[test]
    fn test_malformed_input() {
        for url in ["not a url", "ftp://github.com/a/b/tree/main/x", "https://github.com/solo"] {
            assert!(matches!(
                resolve(url),
                Err(Error::InvalidReference {
                    reason: InvalidReason::Malformed,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_enterprise_host_uses_api_v3() {
        let (endpoint, _) =
            resolve("https://git.example.com:8443/team/tool/tree/main/src").unwrap();
        assert_eq!(
            endpoint.url,
            "https://git.example.com:8443/api/v3/repos/team/tool/contents/src?ref=main"
        );
    }

    #[test]
    fn test_api_override() {
        let (endpoint, _) = resolve_with_api(
            "https://github.com/user/repo/tree/main/src",
            Some("http://127.0.0.1:9000/repos/"),
        )
        .unwrap();
        assert_eq!(
            endpoint.url,
            "http://127.0.0.1:9000/repos/user/repo/contents/src?ref=main"
        );
    }
}
