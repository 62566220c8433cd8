//! # mdbook-stitch
//!
//! Tools for working with mdBook-style books kept as chapter folders.
//!
//! ## Features
//!
//! - Merge every `ch*` folder of a book into a single markdown document,
//!   chapters in name order and each chapter's `readme.md` first
//! - Restore fenced code blocks in a translated document from the original,
//!   block by block, leaving the translated prose untouched
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdbook_stitch::{merge, replace_broken_code};
//!
//! # fn main() -> anyhow::Result<()> {
//! merge("./book", "merged.md")?;
//! replace_broken_code("original.md", "translated.md", "translated-fixed.md")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Two independent pipelines:
//! 1. **Collector** → **Merger**: lists chapter files, concatenates their bytes
//! 2. **Extractor** → **Splicer**: reads code blocks from the reference file,
//!    swaps them into the fenced regions of the target file

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod collector;
mod config;
mod error;
mod extractor;
mod fence;
mod merger;
mod pipeline;
mod splicer;

pub use collector::ChapterCollector;
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use extractor::{extract_blocks, extract_blocks_from_file, CodeBlock};
pub use merger::{MergeStats, Merger};
pub use pipeline::{Pipeline, PipelineStats};
pub use splicer::{splice_blocks, splice_blocks_into_file, SpliceStats};

use std::path::{Path, PathBuf};

/// Runs the complete pipeline with the given configuration.
///
/// # Errors
///
/// Returns an error if configuration is invalid or any enabled job fails.
///
/// # Examples
///
/// ```no_run
/// use mdbook_stitch::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .book_dir("./book")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<PipelineStats> {
    Pipeline::new(config)?.run()
}

/// Merges the chapter files under `book_dir` into `out_file`.
///
/// Chapters are the entries of `book_dir` whose name starts with `ch`,
/// taken in name order. Inside each chapter, `readme.md` comes first and
/// the remaining files follow in name order.
///
/// # Errors
///
/// Returns an error if the book cannot be listed, a chapter file cannot be
/// read, or the output cannot be written.
pub fn merge(book_dir: impl Into<PathBuf>, out_file: impl Into<PathBuf>) -> Result<MergeStats> {
    let files = ChapterCollector::new(book_dir).collect()?;
    Merger::new(out_file).merge(&files)
}

/// Replaces every fenced code block of `broken_file` with the matching
/// block of `reference_file` and writes the result to `out_file`.
///
/// Blocks are matched by position: the n-th region of the broken file gets
/// the n-th block of the reference.
///
/// # Errors
///
/// Returns an error if a file cannot be opened, read or written, or the
/// broken file has more fenced regions than the reference has blocks.
pub fn replace_broken_code(
    reference_file: impl AsRef<Path>,
    broken_file: impl AsRef<Path>,
    out_file: impl AsRef<Path>,
) -> Result<SpliceStats> {
    let blocks = extract_blocks_from_file(reference_file)?;
    splice_blocks_into_file(&blocks, broken_file, out_file)
}
