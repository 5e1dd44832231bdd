// src/github/listing.rs
// =============================================================================
// Wire format of the GitHub contents API and its conversion into TreeEntry.
//
// GET /repos/{owner}/{repo}/contents/{path}?ref={ref} answers with either:
// - one object, when {path} is a file
// - an array of objects, when {path} is a directory
//
// A directory entry has `download_url: null` and is walked through its `url`
// (another contents API URL).
// =============================================================================

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::github::resolve;

/// One object exactly as the API sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    /// API URL of this entry (used to list directories)
    #[serde(default)]
    pub url: Option<String>,
    /// Browsable URL of this entry
    #[serde(default)]
    pub html_url: Option<String>,
}

// untagged: serde tries each shape in order
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing {
    Many(Vec<RawEntry>),
    Single(RawEntry),
}

impl Listing {
    pub fn parse(url: &str, body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|source| Error::UnexpectedListing {
            url: url.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    File {
        name: String,
        path: String,
        content_url: String,
        browse_url: Option<String>,
    },
    Directory {
        name: String,
        path: String,
        listing_url: String,
        browse_url: Option<String>,
    },
    /// Entries we can't walk (submodules, directories with no usable URL)
    Unsupported { name: String, kind: String },
}

impl From<RawEntry> for TreeEntry {
    fn from(raw: RawEntry) -> Self {
        let kind = raw.kind.unwrap_or_default();

        // Submodules point into another repository
        if kind == "submodule" {
            return TreeEntry::Unsupported { name: raw.name, kind };
        }

        if let Some(content_url) = raw.download_url {
            return TreeEntry::File {
                name: raw.name,
                path: raw.path,
                content_url,
                browse_url: raw.html_url,
            };
        }

        // Prefer the API URL; fall back to resolving the browsable one
        let listing_url = raw.url.or_else(|| {
            raw.html_url
                .as_deref()
                .and_then(|html| resolve::resolve(html).ok())
                .map(|(endpoint, _)| endpoint.url)
        });

        match listing_url {
            Some(listing_url) => TreeEntry::Directory {
                name: raw.name,
                path: raw.path,
                listing_url,
                browse_url: raw.html_url,
            },
            None => TreeEntry::Unsupported {
                name: raw.name,
                kind: if kind.is_empty() { "unknown".to_string() } else { kind },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directory_listing() {
        let body = br#"[
            {"name": "a.md", "path": "docs/a.md", "type": "file",
             "download_url": "https://raw.githubusercontent.com/u/r/main/docs/a.md",
             "url": "https://api.github.com/repos/u/r/contents/docs/a.md?ref=main",
             "html_url": "https://github.com/u/r/blob/main/docs/a.md"},
            {"name": "img", "path": "docs/img", "type": "dir",
             "download_url": null,
             "url": "https://api.github.com/repos/u/r/contents/docs/img?ref=main",
             "html_url": "https://github.com/u/r/tree/main/docs/img"}
        ]"#;

        let Listing::Many(raw) = Listing::parse("x", body).unwrap() else {
            panic!("expected an array listing");
        };
        let entries: Vec<TreeEntry> = raw.into_iter().map(TreeEntry::from).collect();

        assert!(matches!(&entries[0], TreeEntry::File { name, .. } if name == "a.md"));
        assert!(matches!(
            &entries[1],
            TreeEntry::Directory { listing_url, .. }
                if listing_url == "https://api.github.com/repos/u/r/contents/docs/img?ref=main"
        ));
    }

    #[test]
    fn test_parse_single_file() {
        let body = br#"{"name": "lib.rs", "path": "src/lib.rs", "type": "file",
                        "download_url": "https://raw.example/src/lib.rs"}"#;
        assert!(matches!(
            Listing::parse("x", body).unwrap(),
            Listing::Single(RawEntry { ref name, .. }) if name == "lib.rs"
        ));
    }

    #[test]
    fn test_directory_falls_back_to_html_url() {
        let raw = RawEntry {
            name: "sub".to_string(),
            path: "docs/sub".to_string(),
            kind: Some("dir".to_string()),
            download_url: None,
            url: None,
            html_url: Some("https://github.com/u/r/tree/dev/docs/sub".to_string()),
        };
        assert_eq!(
            TreeEntry::from(raw),
            TreeEntry::Directory {
                name: "sub".to_string(),
                path: "docs/sub".to_string(),
                listing_url: "https://api.github.com/repos/u/r/contents/docs/sub?ref=dev"
                    .to_string(),
                browse_url: Some("https://github.com/u/r/tree/dev/docs/sub".to_string()),
            }
        );
    }

    #[test]
    fn test_submodule_is_unsupported() {
        let raw = RawEntry {
            name: "vendor".to_string(),
            path: "vendor".to_string(),
            kind: Some("submodule".to_string()),
            download_url: None,
            url: Some("https://api.github.com/repos/u/r/contents/vendor".to_string()),
            html_url: None,
        };
        assert!(matches!(TreeEntry::from(raw), TreeEntry::Unsupported { .. }));
    }

    #[test]
    fn test_garbage_body_is_an_error() {
        assert!(matches!(
            Listing::parse("http://x", b"{\"message\": \"Not Found\"}"),
            Err(Error::UnexpectedListing { .. })
        ));
    }
}
