// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging, the HTTP client and the Ctrl-C handler
// 3. Resolve and materialize each URL in turn
// 4. Exit with proper code (0 = all good, 1 = some URL failed, 130 = interrupted)
// =============================================================================

mod cli;          // src/cli.rs - command-line parsing
mod error;        // src/error.rs - error types
mod github;       // src/github/ - URL resolving and API access
mod materialize;  // src/materialize/ - walking the tree and writing files

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use cli::Cli;
use github::{ApiClient, RetryPolicy};
use materialize::{
    Always, Cancellation, ConflictChoice, ConflictResolver, ExtensionFilter, MaterializeOptions,
    MaterializeSummary, Materializer, Progress, Prompt, Terminal,
};

// Conventional exit status for "terminated by Ctrl-C"
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✘ Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every URL downloaded (or had nothing matching)
//   Ok(1) = at least one URL failed
//   Ok(130) = interrupted
//   Err = setup failed before any URL was tried
async fn run() -> Result<i32> {
    // Parse before tracing so --help works without logs
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    debug!(?cli, "CLI arguments parsed");

    let proxy = match &cli.proxy {
        Some(path) => pick_proxy(path),
        None => None,
    };
    if let Some(proxy) = &proxy {
        println!("Trying proxy: {}", proxy);
    }

    let client = ApiClient::new(proxy.as_deref()).context("failed to build HTTP client")?;

    let options = MaterializeOptions {
        output_dir: cli.output_dir.clone(),
        flatten: cli.flatten,
        force: cli.force,
        extensions: ExtensionFilter::new(&cli.exts),
        retry: RetryPolicy {
            max_retries: cli.max_retries,
            ..RetryPolicy::default()
        },
    };

    let cancel = Cancellation::new();
    spawn_ctrl_c_handler(cancel.clone());

    let progress = Terminal;
    // --force never needs to ask
    let conflicts: Box<dyn ConflictResolver> = if cli.force {
        Box::new(Always(ConflictChoice::Overwrite))
    } else {
        Box::new(Prompt)
    };

    let mut exit_code = 0;
    for url in &cli.urls {
        match download_one(
            url,
            cli.api_url.as_deref(),
            &client,
            &options,
            &progress,
            conflicts.as_ref(),
            &cancel,
        )
        .await
        {
            Ok(summary) => println!("\r{}", completion_line(url, &summary)),
            Err(e) if e.is_interrupt() => {
                if let error::Error::Interrupted { completed } = e {
                    println!("\r✘ Got interrupted, but downloaded {} file(s)", completed);
                }
                return Ok(EXIT_INTERRUPTED);
            }
            Err(e) => {
                println!("\r✘ {}", e);
                exit_code = 1;
            }
        }
    }

    Ok(exit_code)
}

// Resolves one URL and materializes it
async fn download_one(
    url: &str,
    api_url: Option<&str>,
    client: &ApiClient,
    options: &MaterializeOptions,
    progress: &dyn Progress,
    conflicts: &dyn ConflictResolver,
    cancel: &Cancellation,
) -> error::Result<MaterializeSummary> {
    let (endpoint, relative_path) = github::resolve_with_api(url, api_url)?;
    info!(%url, endpoint = %endpoint.url, path = %relative_path, "resolved");

    let summary = Materializer::new(client, options, progress, conflicts, cancel)
        .materialize(&endpoint, &relative_path)
        .await?;

    if summary.filtered > 0 || summary.skipped_existing > 0 {
        info!(
            filtered = summary.filtered,
            skipped = summary.skipped_existing,
            "some files were not written"
        );
    }
    Ok(summary)
}

// The per-URL result line. "Not found" only when the tree had no files at
// all; otherwise say why nothing was written.
fn completion_line(url: &str, summary: &MaterializeSummary) -> String {
    if summary.written > 0 {
        format!("✔ Download complete: {} file(s)", summary.written)
    } else if summary.listed == 0 {
        format!("✘ Files not found: {}", url)
    } else {
        format!(
            "✘ No files written ({} found: {} filtered out, {} kept existing)",
            summary.listed, summary.filtered, summary.skipped_existing
        )
    }
}

// RUST_LOG wins; otherwise -q/-v pick the level. The default is quiet
// enough that only the ✔/✘ lines show up.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Reads the proxy list and picks one line at random. An unreadable or
// empty file is reported and the run continues without a proxy.
fn pick_proxy(path: &Path) -> Option<String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            println!("✘ No proxy txt file found: {}", path.display());
            warn!(path = %path.display(), error = %e, "can't read proxy list");
            return None;
        }
    };

    let proxies = parse_proxy_list(&contents);
    let choice = proxies.choose(&mut rand::thread_rng()).map(|p| p.to_string());
    if choice.is_none() {
        warn!(path = %path.display(), "proxy list is empty");
    }
    choice
}

fn parse_proxy_list(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

fn spawn_ctrl_c_handler(cancel: Cancellation) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received");
            cancel.cancel();
        }
    });
}
