// src/materialize/queue.rs
// =============================================================================
// This module walks a remote directory tree depth-first and writes each file.
//
// How it works:
// 1. Fetch the listing for the requested path
// 2. Push its entries onto a stack (reversed, so the first entry pops first)
// 3. Pop an entry:
//    - file: filter, check for conflicts, download, write
//    - directory: fetch its listing, create the local directory, push its
//      entries on top of the stack
// 4. Repeat until the stack is empty
//
// Because children are pushed on top, a subdirectory is finished before its
// parent's next sibling starts: depth-first pre-order, in listing order.
// An explicit stack instead of recursion means deep trees can't overflow.
// =============================================================================

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::policy;
use super::progress::SkipReason;
use super::{ConflictChoice, DownloadTask, MaterializeSummary, Materializer};
use crate::error::{Error, Result};
use crate::github::{Listing, ListingEndpoint, RawEntry, TreeEntry};

// One pending entry and the local directory it belongs in
#[derive(Debug)]
struct WorkItem {
    entry: TreeEntry,
    local_dir: PathBuf,
}

#[derive(Debug, Clone, Copy)]
enum FetchKind {
    Listing,
    File,
}

impl Materializer<'_> {
    // Materializes everything below `endpoint`
    //
    // Parameters:
    //   endpoint: listing URL produced by the resolver
    //   relative_path: requested path inside the repository; unless
    //                  flattening, it is recreated under the output dir
    //
    // Returns: counts for the run; `written` is the file count
    pub async fn materialize(
        &self,
        endpoint: &ListingEndpoint,
        relative_path: &str,
    ) -> Result<MaterializeSummary> {
        let mut summary = MaterializeSummary::default();
        let mut stack: Vec<WorkItem> = Vec::new();

        info!(url = %endpoint.url, git_ref = %endpoint.git_ref, "fetching listing");
        let listing = self.fetch_listing(&endpoint.url, &summary).await?;

        match listing {
            // The request named a file: it lands under the request's parent
            Listing::Single(raw) => {
                let root = policy::local_root(
                    &self.options.output_dir,
                    relative_path,
                    self.options.flatten,
                );
                self.create_dir(&root).await?;
                stack.push(WorkItem {
                    entry: TreeEntry::from(raw),
                    local_dir: root,
                });
            }
            Listing::Many(entries) => {
                let top = policy::top_directory(
                    &self.options.output_dir,
                    relative_path,
                    self.options.flatten,
                );
                self.create_dir(&top).await?;
                push_entries(&mut stack, entries, &top);
            }
        }

        while let Some(item) = stack.pop() {
            match item.entry {
                TreeEntry::File {
                    name,
                    path,
                    content_url,
                    browse_url,
                } => {
                    summary.listed += 1;
                    debug!(remote = %path, browse = ?browse_url, "file entry");
                    self.handle_file(name, path, content_url, &item.local_dir, &mut summary)
                        .await?;
                }
                TreeEntry::Directory {
                    name,
                    path,
                    listing_url,
                    browse_url,
                } => {
                    if !policy::is_safe_name(&name) {
                        warn!(name = %name, "skipping directory with unsafe name");
                        self.progress.file_skipped(&name, SkipReason::UnsafeName);
                        continue;
                    }

                    let local_dir = policy::child_directory(
                        &item.local_dir,
                        &self.options.output_dir,
                        &name,
                        self.options.flatten,
                    );

                    debug!(
                        remote = %path,
                        browse = ?browse_url,
                        url = %listing_url,
                        dir = %local_dir.display(),
                        "descending"
                    );
                    let entries = match self.fetch_listing(&listing_url, &summary).await? {
                        Listing::Many(entries) => entries,
                        Listing::Single(raw) => vec![raw],
                    };

                    self.create_dir(&local_dir).await?;
                    push_entries(&mut stack, entries, &local_dir);
                }
                TreeEntry::Unsupported { name, kind } => {
                    warn!(name = %name, kind = %kind, "skipping entry that can't be downloaded");
                    self.progress.file_skipped(&name, SkipReason::Unsupported);
                }
            }
        }

        info!(
            listed = summary.listed,
            written = summary.written,
            skipped = summary.skipped_existing,
            filtered = summary.filtered,
            "materialization finished"
        );
        Ok(summary)
    }

    async fn handle_file(
        &self,
        name: String,
        remote_path: String,
        content_url: String,
        local_dir: &Path,
        summary: &mut MaterializeSummary,
    ) -> Result<()> {
        if !policy::is_safe_name(&name) {
            warn!(name = %name, "skipping file with unsafe name");
            self.progress.file_skipped(&name, SkipReason::UnsafeName);
            return Ok(());
        }

        if !self.options.extensions.allows(&name) {
            debug!(name = %name, "filtered out by extension");
            summary.filtered += 1;
            self.progress.file_skipped(&name, SkipReason::Filtered);
            return Ok(());
        }

        let task = DownloadTask {
            destination: local_dir.join(&name),
            name,
            content_url,
            remote_path,
        };
        self.download(task, summary).await
    }

    async fn download(&self, task: DownloadTask, summary: &mut MaterializeSummary) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Interrupted {
                completed: summary.written,
            });
        }

        // Check-then-write is not atomic; nothing else is expected to write here
        let exists = tokio::fs::metadata(&task.destination).await.is_ok();
        if exists && !self.options.force {
            // The answer may never come; Ctrl-C still ends the run
            let answer = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(Error::Interrupted {
                        completed: summary.written,
                    })
                }
                answer = self.conflicts.resolve(&task.destination) => answer?,
            };
            match answer {
                ConflictChoice::Overwrite => {
                    debug!(path = %task.destination.display(), "overwriting existing file");
                }
                ConflictChoice::Skip => {
                    summary.skipped_existing += 1;
                    self.progress.file_skipped(&task.name, SkipReason::Exists);
                    return Ok(());
                }
            }
        }

        self.progress.file_started(&task);
        // The whole body is buffered first, so an interrupt mid-download
        // leaves no partial file behind
        let body = self
            .fetch_with_retry(&task.content_url, FetchKind::File, summary.written)
            .await?;

        tokio::fs::write(&task.destination, &body)
            .await
            .map_err(|e| Error::io(&task.destination, e))?;

        summary.written += 1;
        debug!(remote = %task.remote_path, local = %task.destination.display(), bytes = body.len(), "file written");
        self.progress.file_written(&task);
        Ok(())
    }

    async fn fetch_listing(&self, url: &str, summary: &MaterializeSummary) -> Result<Listing> {
        let body = self
            .fetch_with_retry(url, FetchKind::Listing, summary.written)
            .await?;
        Listing::parse(url, &body)
    }

    // One logical request: re-sends the same URL while the API reports a rate
    // limit, up to the policy's retry budget. Ctrl-C wins over both the request
    // and the wait.
    async fn fetch_with_retry(&self, url: &str, kind: FetchKind, completed: usize) -> Result<Vec<u8>> {
        let policy = &self.options.retry;
        let mut retries = 0;

        loop {
            let request = async {
                match kind {
                    FetchKind::Listing => self.client.get_listing(url).await,
                    FetchKind::File => self.client.get_file(url).await,
                }
            };

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Interrupted { completed }),
                result = request => result,
            };

            match result {
                Err(Error::RateLimited { retry_after, .. }) if retries < policy.max_retries => {
                    retries += 1;
                    let delay = policy.delay_for(retries, retry_after);
                    warn!(
                        url,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "API rate limit exceeded, retrying"
                    );
                    self.progress.rate_limited(url, retries, delay);

                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(Error::Interrupted { completed }),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(Error::RateLimited { retry_after, .. }) => {
                    return Err(Error::RateLimited {
                        url: url.to_string(),
                        attempts: retries + 1,
                        retry_after,
                    });
                }
                other => return other,
            }
        }
    }

    async fn create_dir(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::io(dir, e))?;
        self.progress.directory_created(dir);
        Ok(())
    }
}

// Reversed so the first listed entry is popped first
fn push_entries(stack: &mut Vec<WorkItem>, entries: Vec<RawEntry>, local_dir: &Path) {
    for raw in entries.into_iter().rev() {
        stack.push(WorkItem {
            entry: TreeEntry::from(raw),
            local_dir: local_dir.to_path_buf(),
        });
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a Vec as a stack and not VecDeque?
//    - Depth-first only ever needs push/pop at one end
//    - Pushing a directory's children on top makes them run before the
//      parent's remaining siblings
//
// 2. Why `biased;` in select!?
//    - select! normally picks a random ready branch
//    - biased checks branches top to bottom, so an already-set cancel flag
//      always wins and the request is never even started
//
// 3. Rate limits and counting:
//    - A retry re-sends one URL; files written before it are never revisited
//    - So `written` can't be inflated by retries
// -----------------------------------------------------------------------------
