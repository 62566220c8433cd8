use crate::{
    error::{Error, Result},
    fence::{is_fence, FENCE},
};
use serde::Serialize;
use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::{debug, trace, warn};

/// A fenced code block, delimiters included.
///
/// The text starts with the opening fence line as written (info string
/// kept) and ends with a bare closing fence. Every line ends with `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    text: String,
}

impl CodeBlock {
    /// Returns the full block text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the info string of the opening fence, if any.
    #[must_use]
    pub fn info(&self) -> Option<&str> {
        let first = self.text.lines().next()?;
        let info = first.strip_prefix(FENCE)?.trim();
        (!info.is_empty()).then_some(info)
    }

    /// Returns the number of lines, fences included.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

enum ExtractState {
    Outside,
    Inside { text: String, opened_at: usize },
}

/// Extracts all fenced code blocks from a markdown file, in file order.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn extract_blocks_from_file(path: impl AsRef<Path>) -> Result<Vec<CodeBlock>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    extract_blocks(BufReader::new(file), path)
}

/// Extracts all fenced code blocks from `reader`.
///
/// `source` only labels errors and log lines. A block still open at the end
/// of input is dropped.
///
/// # Errors
///
/// Returns an error if reading fails or a line is not valid UTF-8.
pub fn extract_blocks<R: BufRead>(reader: R, source: &Path) -> Result<Vec<CodeBlock>> {
    let mut blocks = Vec::new();
    let mut state = ExtractState::Outside;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io(source, e))?;
        let line_no = index + 1;

        state = match state {
            ExtractState::Outside if is_fence(&line) => {
                trace!("Block opens at {}:{}", source.display(), line_no);
                let mut text = line;
                text.push('\n');
                ExtractState::Inside {
                    text,
                    opened_at: line_no,
                }
            }
            ExtractState::Outside => ExtractState::Outside,
            ExtractState::Inside { mut text, .. } if is_fence(&line) => {
                text.push_str(FENCE);
                text.push('\n');
                blocks.push(CodeBlock { text });
                ExtractState::Outside
            }
            ExtractState::Inside {
                mut text,
                opened_at,
            } => {
                text.push_str(&line);
                text.push('\n');
                ExtractState::Inside { text, opened_at }
            }
        };
    }

    if let ExtractState::Inside { opened_at, .. } = state {
        warn!(
            "Dropping unterminated code block opened at {}:{}",
            source.display(),
            opened_at
        );
    }

    debug!("Extracted {} code blocks from {}", blocks.len(), source.display());
    Ok(blocks)
}
