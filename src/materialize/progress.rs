// src/materialize/progress.rs
// =============================================================================
// Status output as an injected capability.
//
// The materializer never prints. It tells a Progress implementation what
// happened, and the caller decides what that looks like: a terminal in main,
// a recorder in tests.
// =============================================================================

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::materialize::DownloadTask;

// Why a file was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Extension not in the allow-list
    Filtered,
    /// Destination existed and the user chose not to overwrite
    Exists,
    /// Name would escape the output directory
    UnsafeName,
    /// Submodule or other entry type we can't download
    Unsupported,
}

pub trait Progress: Send + Sync {
    fn directory_created(&self, _path: &Path) {}
    fn file_started(&self, _task: &DownloadTask) {}
    fn file_written(&self, _task: &DownloadTask) {}
    fn file_skipped(&self, _name: &str, _reason: SkipReason) {}
    fn rate_limited(&self, _url: &str, _attempt: u32, _delay: Duration) {}
}

/// Discards everything.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Silent;

#[cfg(test)]
impl Progress for Silent {}

// ANSI code that erases the current line
const ERASE_LINE: &str = "\x1b[2K";

/// Prints one line per written file, and rewrites a single status line
/// for transient messages like rate-limit waits.
#[derive(Debug, Default)]
pub struct Terminal;

impl Terminal {
    fn in_place(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r{}{}", ERASE_LINE, text);
        let _ = stdout.flush();
    }
}

impl Progress for Terminal {
    fn file_written(&self, task: &DownloadTask) {
        print!("\r{}", ERASE_LINE);
        println!("✔ Downloaded: {}", task.name);
    }

    fn file_skipped(&self, name: &str, reason: SkipReason) {
        match reason {
            SkipReason::Exists => {
                print!("\r{}", ERASE_LINE);
                println!("↷ Skipped (exists): {}", name);
            }
            SkipReason::UnsafeName | SkipReason::Unsupported => {
                print!("\r{}", ERASE_LINE);
                println!("⚠️  Skipped: {}", name);
            }
            // Filtered files are expected, no need to list them
            SkipReason::Filtered => {}
        }
    }

    fn file_started(&self, task: &DownloadTask) {
        self.in_place(&format!("▶ Downloading: {}", task.name));
    }

    fn rate_limited(&self, _url: &str, attempt: u32, delay: Duration) {
        self.in_place(&format!(
            "✘ API rate limit exceeded, retry {} in {}s",
            attempt,
            delay.as_secs()
        ));
    }
}
