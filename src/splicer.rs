use crate::{
    error::{Error, Result},
    extractor::CodeBlock,
    fence::is_fence,
};
use serde::Serialize;
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};
use tracing::{debug, trace, warn};

/// Statistics for one splice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpliceStats {
    /// Code blocks available from the reference
    pub available_blocks: usize,

    /// Fenced regions replaced in the target
    pub regions_replaced: usize,

    /// Reference blocks left over after the target ran out of regions
    pub unused_blocks: usize,

    /// Lines copied verbatim from outside fenced regions
    pub lines_copied: usize,

    /// Line number of a region still open at end of input
    pub unterminated_at: Option<usize>,
}

enum SpliceState {
    Outside,
    Inside { opened_at: usize },
}

/// Splices `blocks` into the fenced regions of `input`, writing `output`.
///
/// # Errors
///
/// Returns an error if:
/// - The input cannot be opened or read
/// - The output cannot be created or written
/// - The input has more fenced regions than there are blocks
pub fn splice_blocks_into_file(
    blocks: &[CodeBlock],
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<SpliceStats> {
    let input = input.as_ref();
    let output = output.as_ref();

    let reader = BufReader::new(File::open(input).map_err(|e| Error::io(input, e))?);
    let mut writer = BufWriter::new(File::create(output).map_err(|e| Error::io(output, e))?);

    let stats = splice_blocks(blocks, reader, input, &mut writer, output)?;
    writer.flush().map_err(|e| Error::io(output, e))?;

    Ok(stats)
}

/// Copies `reader` to `writer`, replacing each fenced region (fences
/// included) with the next block of `blocks`.
///
/// Lines outside fenced regions are copied byte for byte, each followed by
/// `\n`; they need not be valid UTF-8. `input` and `output` only label
/// errors and log lines. Output written before an error is left in place.
///
/// # Errors
///
/// Returns an error if reading or writing fails, or a region closes after
/// every block has been used.
pub fn splice_blocks<R: BufRead, W: Write>(
    blocks: &[CodeBlock],
    mut reader: R,
    input: &Path,
    writer: &mut W,
    output: &Path,
) -> Result<SpliceStats> {
    let mut stats = SpliceStats {
        available_blocks: blocks.len(),
        ..SpliceStats::default()
    };
    let mut state = SpliceState::Outside;
    let mut line = Vec::new();
    let mut line_no = 0;

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io(input, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        trim_line_ending(&mut line);

        state = match state {
            SpliceState::Outside if is_fence(&line) => SpliceState::Inside { opened_at: line_no },
            SpliceState::Outside => {
                writer
                    .write_all(&line)
                    .and_then(|()| writer.write_all(b"\n"))
                    .map_err(|e| Error::io(output, e))?;
                stats.lines_copied += 1;
                SpliceState::Outside
            }
            SpliceState::Inside { opened_at } if is_fence(&line) => {
                let region = stats.regions_replaced;
                let block = blocks
                    .get(region)
                    .ok_or_else(|| Error::blocks_exhausted(input, region + 1, blocks.len()))?;
                writer
                    .write_all(block.as_str().as_bytes())
                    .map_err(|e| Error::io(output, e))?;
                trace!(
                    "Replaced region {}:{}-{} with block #{}",
                    input.display(),
                    opened_at,
                    line_no,
                    region + 1
                );
                stats.regions_replaced += 1;
                SpliceState::Outside
            }
            inside @ SpliceState::Inside { .. } => inside,
        };
    }

    if let SpliceState::Inside { opened_at } = state {
        warn!(
            "Fenced region opened at {}:{} is never closed; its lines were dropped",
            input.display(),
            opened_at
        );
        stats.unterminated_at = Some(opened_at);
    }

    stats.unused_blocks = blocks.len() - stats.regions_replaced;
    if stats.unused_blocks > 0 {
        warn!(
            "{} of {} reference code blocks were not used for {}",
            stats.unused_blocks,
            blocks.len(),
            input.display()
        );
    }

    debug!(
        "Replaced {} regions and copied {} lines into {}",
        stats.regions_replaced,
        stats.lines_copied,
        output.display()
    );
    Ok(stats)
}

/// Strips a trailing `\n` or `\r\n`, the same endings `BufRead::lines` drops.
fn trim_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}
