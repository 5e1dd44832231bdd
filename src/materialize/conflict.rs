// src/materialize/conflict.rs
// =============================================================================
// What to do when a destination file already exists.
//
// With --force nobody is asked. Otherwise a ConflictResolver decides; on a
// terminal that means a [y/N] prompt where an empty answer keeps the file.
//
// resolve() is async so the walk can race it against Ctrl-C. The stdin read
// itself blocks, so Prompt runs it on tokio's blocking pool.
// =============================================================================

use std::io::{BufRead, Write};
use std::path::Path;

use async_trait::async_trait;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    Overwrite,
    Skip,
}

#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve(&self, path: &Path) -> Result<ConflictChoice>;
}

/// Gives the same answer every time.
#[derive(Debug, Clone, Copy)]
pub struct Always(pub ConflictChoice);

#[async_trait]
impl ConflictResolver for Always {
    async fn resolve(&self, _path: &Path) -> Result<ConflictChoice> {
        Ok(self.0)
    }
}

/// Asks on stdin.
#[derive(Debug, Default)]
pub struct Prompt;

#[async_trait]
impl ConflictResolver for Prompt {
    async fn resolve(&self, path: &Path) -> Result<ConflictChoice> {
        let path = path.to_path_buf();
        // An abandoned read keeps its thread until stdin closes; main exits
        // the process right after an interrupt, so nothing waits on it
        tokio::task::spawn_blocking(move || ask(&path))
            .await
            .map_err(|e| Error::Prompt {
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?
    }
}

fn ask(path: &Path) -> Result<ConflictChoice> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "\r{} already exists. Overwrite? [y/N] ", path.display())
        .and_then(|_| stdout.flush())
        .map_err(|source| Error::Prompt { source })?;
    drop(stdout);

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|source| Error::Prompt { source })?;

    Ok(parse_answer(&answer))
}

// Only an explicit yes overwrites; empty input, EOF and anything else skip
pub fn parse_answer(answer: &str) -> ConflictChoice {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => ConflictChoice::Overwrite,
        _ => ConflictChoice::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), ConflictChoice::Overwrite);
        assert_eq!(parse_answer("  YES "), ConflictChoice::Overwrite);
        assert_eq!(parse_answer("\n"), ConflictChoice::Skip);
        assert_eq!(parse_answer(""), ConflictChoice::Skip);
        assert_eq!(parse_answer("n"), ConflictChoice::Skip);
        assert_eq!(parse_answer("maybe"), ConflictChoice::Skip);
    }

    #[tokio::test]
    async fn test_always_ignores_the_path() {
        let resolver = Always(ConflictChoice::Overwrite);
        let choice = resolver.resolve(Path::new("/anything")).await.unwrap();
        assert_eq!(choice, ConflictChoice::Overwrite);
    }
}
