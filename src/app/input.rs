//! Input reading.
//!
//! Locators come one per line from a file, or from stdin when the path is `-`.
//! Blank lines and `#` comments are skipped, surrounding whitespace is trimmed,
//! and duplicates are dropped keeping the first occurrence.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Reads the deduplicated locator list from `path` (`-` for stdin).
///
/// # Errors
///
/// Returns an error if the input file cannot be opened.
pub async fn read_locators(path: &Path) -> Result<Vec<String>> {
    let locators = if path.as_os_str() == "-" {
        info!("Reading locators from stdin");
        collect_locators(BufReader::new(tokio::io::stdin())).await
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        collect_locators(BufReader::new(file)).await
    };
    info!("Total locators in input: {}", locators.len());
    Ok(locators)
}

async fn collect_locators<R: AsyncBufRead + Unpin>(reader: R) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut locators = Vec::new();
    let mut lines = reader.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read line from input: {e}");
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            locators.push(trimmed.to_string());
        }
    }

    locators
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_collect_skips_comments_and_duplicates() {
        let input = "\
# harvested 2024-06-01
http://example.com/a.csv

  ftp://ftp.example.com/pub/b.csv  
http://example.com/a.csv
not a url
";
        let locators = collect_locators(BufReader::new(input.as_bytes())).await;
        assert_eq!(
            locators,
            vec![
                "http://example.com/a.csv".to_string(),
                "ftp://ftp.example.com/pub/b.csv".to_string(),
                "not a url".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_locators_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "http://example.com/x.json").expect("write");
        writeln!(file, "http://example.com/y.json").expect("write");

        let locators = read_locators(file.path()).await.expect("read");
        assert_eq!(locators.len(), 2);
    }

    #[tokio::test]
    async fn test_read_locators_missing_file() {
        let err = read_locators(Path::new("/nonexistent/resources.txt"))
            .await
            .expect_err("missing file");
        assert!(err.to_string().contains("Failed to open input file"));
    }
}
