// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the struct below *is* the CLI. Flags that make
// sense in scripts (API URL, retry budget) can also come from GITDIR_*
// environment variables thanks to clap's `env` feature.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "gitdir",
    version,
    about = "Download a single directory or file from a GitHub repository",
    long_about = "gitdir downloads a directory (or a single file) from a GitHub repository \
                  without cloning the whole repository. Point it at a URL you'd open in the \
                  browser, e.g. https://github.com/owner/repo/tree/main/docs"
)]
pub struct Cli {
    /// GitHub directory or file URLs (https://github.com/<owner>/<repo>/tree/<ref>/<path>)
    #[arg(required = true, num_args = 1..)]
    pub urls: Vec<String>,

    /// Directory to download into (must already exist)
    #[arg(short = 'd', long, default_value = ".", value_parser = existing_dir)]
    pub output_dir: PathBuf,

    /// Flatten directory structures: put every file directly in the output directory
    ///
    /// Files with the same name in different folders overwrite each other.
    #[arg(short, long)]
    pub flatten: bool,

    /// Overwrite existing files without asking
    ///
    /// Without it, you're asked for each existing file; pressing Enter keeps the file.
    #[arg(long)]
    pub force: bool,

    /// Only download files with these extensions (e.g. -e md py)
    #[arg(short, long = "exts", num_args = 1..)]
    pub exts: Vec<String>,

    /// Text file with one http proxy (host:port) per line; one is picked at random
    #[arg(short, long = "proxy")]
    pub proxy: Option<PathBuf>,

    /// API base URL, for GitHub Enterprise or testing
    #[arg(long, env = "GITDIR_API_URL")]
    pub api_url: Option<String>,

    /// How many times to retry a request after hitting the API rate limit
    #[arg(long, env = "GITDIR_MAX_RETRIES", default_value_t = 5)]
    pub max_retries: u32,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("'{}' is not an existing directory", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gitdir", "https://github.com/a/b/tree/main/x"]).unwrap();
        assert_eq!(cli.urls.len(), 1);
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(!cli.flatten);
        assert!(!cli.force);
        assert!(cli.exts.is_empty());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "gitdir", "-f", "--force", "-e", "md", ".py", "--", "https://github.com/a/b/tree/main/x",
            "https://github.com/a/b/tree/main/y",
        ])
        .unwrap();
        assert!(cli.flatten);
        assert!(cli.force);
        assert_eq!(cli.exts, vec!["md", ".py"]);
        assert_eq!(cli.urls.len(), 2);
    }

    #[test]
    fn test_urls_are_required() {
        assert!(Cli::try_parse_from(["gitdir"]).is_err());
    }

    #[test]
    fn test_output_dir_must_exist() {
        let result = Cli::try_parse_from([
            "gitdir",
            "-d",
            "/definitely/not/here",
            "https://github.com/a/b/tree/main/x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_clap_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
