//! Whitespace-agnostic text matrix reader.
//!
//! Numbers are scanned out of each line rather than split on a delimiter,
//! so `1 2 3`, `1,2,3` and `[1, 2, 3],` all read as the same row. Lines
//! without any number are skipped. Dimensions come from the data itself.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dense::DenseMatrix;
use crate::error::{MatrixError, Result};
use crate::flat::FlatMatrix;
use crate::nested::NestedMatrix;

fn is_token_start(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-')
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

/// Extracts the raw numeric tokens of one line.
fn scan_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find(is_token_start) {
        let tail = &rest[start..];
        let end = tail.find(|c: char| !is_token_char(c)).unwrap_or(tail.len());
        tokens.push(&tail[..end]);
        rest = &tail[end..];
    }
    tokens
}

/// Parses every numeric line of `text` into a row.
///
/// `origin` is only used to label errors.
///
/// # Errors
/// `InvalidNumber` for a token that is not a valid `f64`, `RaggedRows` when
/// a line's value count differs from the first numeric line, `Empty` when
/// there are no numeric lines at all.
pub fn parse_rows(text: &str, origin: &Path) -> Result<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let row = scan_tokens(line)
            .into_iter()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| MatrixError::InvalidNumber {
                    path: origin.to_path_buf(),
                    line: line_no,
                    token: tok.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if row.is_empty() {
            continue;
        }
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(MatrixError::RaggedRows {
                    path: origin.to_path_buf(),
                    line: line_no,
                    expected: first.len(),
                    got: row.len(),
                });
            }
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(MatrixError::Empty {
            path: origin.to_path_buf(),
        });
    }
    Ok(rows)
}

/// Reads and parses the file at `path`.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<f64>>> {
    let text = std::fs::read_to_string(path).map_err(|source| MatrixError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    let rows = parse_rows(&text, path)?;
    debug!(
        path = %path.display(),
        rows = rows.len(),
        cols = rows[0].len(),
        "loaded matrix text"
    );
    Ok(rows)
}

impl NestedMatrix {
    /// Load a matrix from a text file.
    ///
    /// Nothing is returned unless the whole file is valid.
    pub fn load(path: impl AsRef<Path>) -> Result<NestedMatrix> {
        let rows = read_rows(path.as_ref())?;
        let (r, c) = (rows.len(), rows[0].len());
        NestedMatrix::from_rows(r, c, rows)
    }
}

impl FlatMatrix {
    /// Load a matrix from a text file.
    ///
    /// Nothing is returned unless the whole file is valid.
    pub fn load(path: impl AsRef<Path>) -> Result<FlatMatrix> {
        let nested = NestedMatrix::load(path)?;
        let flat = FlatMatrix::from(&nested);
        debug_assert_eq!(flat.shape(), nested.shape());
        Ok(flat)
    }
}
