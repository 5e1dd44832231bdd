// src/materialize/mod.rs
// =============================================================================
// This module reproduces a remote directory tree on local disk.
//
// Submodules:
// - queue: the depth-first walk, driven by an explicit work stack
// - policy: destination paths and the extension allow-list
// - conflict: what to do when a file already exists
// - progress: status output, injected by the caller
// - cancel: Ctrl-C handling
//
// Everything here runs one step at a time: one listing fetch or one file
// download, never two at once.
// =============================================================================

mod cancel;
mod conflict;
mod policy;
mod progress;
mod queue;

use std::path::PathBuf;

pub use cancel::Cancellation;
pub use conflict::{Always, ConflictChoice, ConflictResolver, Prompt};
pub use policy::ExtensionFilter;
pub use progress::{Progress, Terminal};
#[cfg(test)]
pub use progress::Silent;

use crate::github::{ApiClient, RetryPolicy};

/// Knobs for one materialization run.
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub output_dir: PathBuf,
    /// Put every file directly in `output_dir`
    pub flatten: bool,
    /// Overwrite existing files without asking
    pub force: bool,
    pub extensions: ExtensionFilter,
    pub retry: RetryPolicy,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            flatten: false,
            force: false,
            extensions: ExtensionFilter::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// One file to fetch and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub name: String,
    pub content_url: String,
    /// Slash-separated path relative to the repository root
    pub remote_path: String,
    pub destination: PathBuf,
}

/// Counts for one run.
///
/// `written` is the number reported to the user; the others explain
/// why it may be lower than `listed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    /// File entries seen anywhere in the tree
    pub listed: usize,
    pub written: usize,
    pub skipped_existing: usize,
    pub filtered: usize,
}

/// Walks one listing endpoint and writes what it finds.
///
/// Borrowed collaborators keep the core free of terminal I/O: tests pass
/// a recorder and a scripted conflict answer, main passes the real ones.
pub struct Materializer<'a> {
    client: &'a ApiClient,
    options: &'a MaterializeOptions,
    progress: &'a dyn Progress,
    conflicts: &'a dyn ConflictResolver,
    cancel: &'a Cancellation,
}

impl<'a> Materializer<'a> {
    pub fn new(
        client: &'a ApiClient,
        options: &'a MaterializeOptions,
        progress: &'a dyn Progress,
        conflicts: &'a dyn ConflictResolver,
        cancel: &'a Cancellation,
    ) -> Self {
        Self {
            client,
            options,
            progress,
            conflicts,
            cancel,
        }
    }
}
