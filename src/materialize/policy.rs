// src/materialize/policy.rs
// =============================================================================
// Where files land and which files are wanted.
//
// Layout rules:
// - non-flatten: <out>/<remote path>, parents of the request included
// - flatten:     <out>/<file name>, no matter how deep the file was
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extension allow-list. Empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    allowed: HashSet<String>,
}

impl ExtensionFilter {
    // Accepts "md" and ".md" alike
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().to_string())
            .filter(|ext| !ext.is_empty() && ext != ".")
            .map(|ext| if ext.starts_with('.') { ext } else { format!(".{}", ext) })
            .collect();
        Self { allowed }
    }

    pub fn allows(&self, file_name: &str) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        match extension_of(file_name) {
            Some(ext) => self.allowed.contains(&ext),
            None => false,
        }
    }
}

// ".md" for "notes.md"; None for "Makefile" and ".gitignore"
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
}

// Segments of a slash-separated remote path, minus anything that could
// step outside the output directory
fn remote_segments(relative_path: &str) -> Vec<&str> {
    relative_path
        .split('/')
        .filter(|segment| is_safe_name(segment))
        .collect()
}

// Local root for a request: <out>/<parent of the requested leaf>, so that
// every file ends up at <out>/<remote path>
pub fn local_root(output_dir: &Path, relative_path: &str, flatten: bool) -> PathBuf {
    if flatten {
        return output_dir.to_path_buf();
    }
    let mut segments = remote_segments(relative_path);
    segments.pop();
    segments
        .into_iter()
        .fold(output_dir.to_path_buf(), |dir, segment| dir.join(segment))
}

// Directory that receives the requested directory's own entries
pub fn top_directory(output_dir: &Path, relative_path: &str, flatten: bool) -> PathBuf {
    if flatten {
        return output_dir.to_path_buf();
    }
    remote_segments(relative_path)
        .into_iter()
        .fold(output_dir.to_path_buf(), |dir, segment| dir.join(segment))
}

// Directory for a subdirectory entry found inside `parent`
pub fn child_directory(parent: &Path, output_dir: &Path, name: &str, flatten: bool) -> PathBuf {
    if flatten {
        output_dir.to_path_buf()
    } else {
        parent.join(name)
    }
}

// A name coming from the API must be a single plain path component
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_with_and_without_dot() {
        let filter = ExtensionFilter::new(["md", ".py"]);
        assert!(filter.allows("README.md"));
        assert!(filter.allows("setup.py"));
        assert!(!filter.allows("main.rs"));
        assert!(!filter.allows("Makefile"));
    }

    #[test]
    fn test_empty_filter_allows_everything() {
        let filter = ExtensionFilter::new(Vec::<String>::new());
        assert!(filter.allows("anything"));
        assert!(filter.allows(".gitignore"));
    }

    #[test]
    fn test_extension_is_last_suffix() {
        assert_eq!(extension_of("archive.tar.gz"), Some(".gz".to_string()));
        assert_eq!(extension_of(".gitignore"), None);
        assert_eq!(extension_of("LICENSE"), None);
    }

    #[test]
    fn test_directory_layout() {
        let out = Path::new("/out");
        assert_eq!(local_root(out, "a/b/c", false), PathBuf::from("/out/a/b"));
        assert_eq!(local_root(out, "a/b/c", true), PathBuf::from("/out"));
        assert_eq!(local_root(out, "docs", false), PathBuf::from("/out"));
        assert_eq!(top_directory(out, "a/b/c", false), PathBuf::from("/out/a/b/c"));
        assert_eq!(top_directory(out, "a/b/c", true), PathBuf::from("/out"));
        assert_eq!(
            child_directory(Path::new("/out/a/b/c"), out, "d", false),
            PathBuf::from("/out/a/b/c/d")
        );
        assert_eq!(
            child_directory(Path::new("/out/a/b/c"), out, "d", true),
            PathBuf::from("/out")
        );
    }

    #[test]
    fn test_request_path_cannot_climb_out() {
        let out = Path::new("/out");
        assert_eq!(top_directory(out, "a/../b", false), PathBuf::from("/out/a/b"));
        assert_eq!(local_root(out, "../../f.txt", false), PathBuf::from("/out"));
    }

    #[test]
    fn test_unsafe_names() {
        assert!(is_safe_name("notes.md"));
        assert!(is_safe_name("..hidden"));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name("."));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("../etc"));
        assert!(!is_safe_name("a\\b"));
    }
}
