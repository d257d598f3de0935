//! Pair list parsing.
//!
//! Pairing is supplied externally as comma-separated `source,target` rows,
//! one pair per line, both filenames referencing the same identity. The
//! list is trusted as given; identity verification belongs to the pairing
//! collaborator that produced it.

use std::fs;
use std::path::Path;

use tracing::warn;

use repose_core::{Error, Result};

/// Source and target filenames of one same-identity pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    pub source: String,
    pub target: String,
}

/// Read an ordered pair list from a comma-separated file.
///
/// Blank lines are skipped; any other row that is not exactly two
/// non-empty fields fails with the offending line number. A row pairing a
/// file with itself is accepted but logged, since prefix-grouped pairing
/// can produce it.
pub fn read_pairs(path: &Path) -> Result<Vec<ImagePair>> {
    if !path.exists() {
        return Err(Error::MissingResource {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path)?;

    let mut pairs = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(',');
        let (source, target) = match (fields.next(), fields.next(), fields.next()) {
            (Some(src), Some(tgt), None) if !src.trim().is_empty() && !tgt.trim().is_empty() => {
                (src.trim().to_string(), tgt.trim().to_string())
            }
            _ => {
                return Err(Error::PairList {
                    line: i + 1,
                    message: format!("expected `source,target`, got `{line}`"),
                })
            }
        };
        if source == target {
            warn!(line = i + 1, file = %source, "pair references the same file twice");
        }
        pairs.push(ImagePair { source, target });
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_list(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_reads_ordered_pairs() {
        let (_dir, path) = write_list("a.jpg,b.jpg\nc.jpg,d.jpg\n");
        let pairs = read_pairs(&path).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source, "a.jpg");
        assert_eq!(pairs[0].target, "b.jpg");
        assert_eq!(pairs[1].source, "c.jpg");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (_dir, path) = write_list("a.jpg,b.jpg\n\nc.jpg,d.jpg\n\n");
        assert_eq!(read_pairs(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let (_dir, path) = write_list("a.jpg,b.jpg\nonly-one-field\n");
        let err = read_pairs(&path).unwrap_err();
        match err {
            Error::PairList { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_list_is_missing_resource() {
        let err = read_pairs(Path::new("/nonexistent/pairs.csv")).unwrap_err();
        assert!(matches!(err, Error::MissingResource { .. }));
    }
}
