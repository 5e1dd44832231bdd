// src/error.rs
// =============================================================================
// Error types shared by the resolver and the materializer.
//
// Every failure that can end the processing of one URL is a variant here.
// Only `Interrupted` ends the whole run; everything else lets main move on
// to the next URL.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a browsable URL could not be turned into a listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Not an absolute http(s) URL with a host and `owner/repo`.
    Malformed,
    /// The URL names the repository root; cloning is the right tool for that.
    RepositoryRoot,
    /// No `tree`/`blob` segment followed by a ref could be found.
    MissingBranch,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            InvalidReason::Malformed => "not a repository URL",
            InvalidReason::RepositoryRoot => {
                "the URL is a complete repository, use 'git clone' to download it"
            }
            InvalidReason::MissingBranch => "couldn't find the branch in the URL, check the URL",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid repository URL {url}: {reason}")]
    InvalidReference { url: String, reason: InvalidReason },

    /// Network-level failure (DNS, connect, TLS, body read).
    #[error("network error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status that is not a rate-limit signal.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// API rate limit hit; `attempts` counts every request made for `url`.
    #[error("API rate limit exceeded for {url} after {attempts} attempt(s)")]
    RateLimited {
        url: String,
        attempts: u32,
        retry_after: Option<Duration>,
    },

    /// The user cancelled; `completed` files had been fully written.
    #[error("interrupted after {completed} file(s)")]
    Interrupted { completed: usize },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected listing from {url}: {source}")]
    UnexpectedListing {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read answer: {source}")]
    Prompt {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid(url: &str, reason: InvalidReason) -> Self {
        Error::InvalidReference {
            url: url.to_string(),
            reason,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the whole run must stop, not just the current URL.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Error::Interrupted { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_interrupt_stops_the_run() {
        assert!(Error::Interrupted { completed: 3 }.is_interrupt());
        assert!(!Error::invalid("x", InvalidReason::Malformed).is_interrupt());
        assert!(!Error::HttpStatus {
            url: "x".to_string(),
            status: 404
        }
        .is_interrupt());
    }

    #[test]
    fn test_root_refusal_mentions_git_clone() {
        let err = Error::invalid("https://github.com/a/b", InvalidReason::RepositoryRoot);
        assert!(err.to_string().contains("git clone"));
    }
}
