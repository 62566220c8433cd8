use crate::{
    collector::ChapterCollector,
    config::Config,
    error::{Error, Result},
    extractor::extract_blocks_from_file,
    merger::{MergeStats, Merger},
    splicer::{splice_blocks, splice_blocks_into_file, SpliceStats},
};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

/// Statistics collected during pipeline execution.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    /// Merge job results, if the job ran
    pub merge: Option<MergeStats>,

    /// Patch job results, if the job ran
    pub patch: Option<SpliceStats>,

    /// Whether output files were left untouched
    pub dry_run: bool,

    /// Total execution time
    pub duration: Duration,
}

impl PipelineStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n{}\n", self.summary());
    }

    /// Renders the summary box printed by [`print_summary`](Self::print_summary).
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "╔═══════════════════════════════════════════════════════╗".to_string(),
            "║            Pipeline Execution Summary                 ║".to_string(),
            "╠═══════════════════════════════════════════════════════╣".to_string(),
        ];
        if let Some(merge) = &self.merge {
            lines.push(format!("║ Chapter files merged: {:>8}                        ║", merge.files));
            lines.push(format!("║ Bytes merged:         {:>8}                        ║", merge.bytes));
            lines.push(format!("║   -> {:<49}║", fit_width(&merge.output, 49)));
        }
        if let Some(patch) = &self.patch {
            lines.push(format!("║ Reference blocks:     {:>8}                        ║", patch.available_blocks));
            lines.push(format!("║ Regions replaced:     {:>8}                        ║", patch.regions_replaced));
            lines.push(format!("║ Unused blocks:        {:>8}                        ║", patch.unused_blocks));
            if let Some(line) = patch.unterminated_at {
                lines.push(format!("║ Unterminated at line: {line:>8}                        ║"));
            }
        }
        lines.push("║                                                       ║".to_string());
        lines.push(format!(
            "║ Total time:           {:>8.2}s                       ║",
            self.duration.as_secs_f64()
        ));
        if self.dry_run {
            lines.push("║ ⚠ No files were written (dry run mode)                ║".to_string());
        }
        lines.push("╚═══════════════════════════════════════════════════════╝".to_string());
        lines.join("\n")
    }

    /// Renders the statistics as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Shortens `text` to at most `width` chars, keeping its tail.
fn fit_width(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    let tail: String = text.chars().skip(len - width + 1).collect();
    format!("…{tail}")
}

/// Runs the merge and patch jobs selected by the configuration.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Executes the enabled jobs in order: merge, then patch.
    ///
    /// The first error stops the run.
    ///
    /// # Errors
    ///
    /// Returns an error if either job fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mdbook_stitch::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .book_dir("./book")
    ///     .merged_output("book.md")
    ///     .skip_patch(true)
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(dry_run = self.config.dry_run))]
    pub fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let total = usize::from(self.config.merge_enabled) + usize::from(self.config.patch_enabled);
        let mut stage = 0;

        info!("Starting pipeline execution");
        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file writes");
        }

        let merge = if self.config.merge_enabled {
            stage += 1;
            info!("Stage {stage}/{total}: Merging chapters...");
            Some(self.merge()?)
        } else {
            None
        };

        let patch = if self.config.patch_enabled {
            stage += 1;
            info!("Stage {stage}/{total}: Restoring code blocks...");
            Some(self.patch()?)
        } else {
            None
        };

        let duration = start_time.elapsed();
        info!(
            "✓ Pipeline completed successfully in {:.2}s",
            duration.as_secs_f64()
        );

        Ok(PipelineStats {
            merge,
            patch,
            dry_run: self.config.dry_run,
            duration,
        })
    }

    /// Collects the chapter files and concatenates them.
    fn merge(&self) -> Result<MergeStats> {
        let collector = ChapterCollector::from_config(&self.config);
        let files = collector.collect()?;

        if files.is_empty() {
            warn!(
                "No chapter files found under {} (prefix '{}')",
                collector.book_dir().display(),
                self.config.chapter_prefix
            );
        }

        for file in &files {
            let shown = pathdiff::diff_paths(file, collector.book_dir())
                .unwrap_or_else(|| file.clone());
            debug!("  {}", shown.display());
        }

        let merger = Merger::new(&self.config.merged_output);
        let stats = if self.config.dry_run {
            merger.measure(&files)?
        } else {
            merger.merge(&files)?
        };

        info!(
            "✓ Merged {} files ({} bytes) into {}",
            stats.files,
            stats.bytes,
            merger.output().display()
        );
        Ok(stats)
    }

    /// Extracts the reference blocks and splices them into the broken file.
    fn patch(&self) -> Result<SpliceStats> {
        let blocks = extract_blocks_from_file(&self.config.reference_file)?;
        info!(
            "Extracted {} code blocks from {}",
            blocks.len(),
            self.config.reference_file.display()
        );

        let input = &self.config.broken_file;
        let output = &self.config.patched_output;

        let stats = if self.config.dry_run {
            let reader = BufReader::new(
                File::open(input).map_err(|e| Error::io(input, e))?,
            );
            splice_blocks(&blocks, reader, input, &mut io::sink(), output)?
        } else {
            splice_blocks_into_file(&blocks, input, output)?
        };

        info!(
            "✓ Replaced {} code blocks in {} -> {}",
            stats.regions_replaced,
            input.display(),
            output.display()
        );
        Ok(stats)
    }

    /// Returns the files the merge job would concatenate.
    ///
    /// # Errors
    ///
    /// Returns an error if the book cannot be listed.
    pub fn chapter_files(&self) -> Result<Vec<PathBuf>> {
        ChapterCollector::from_config(&self.config).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn book(temp: &assert_fs::TempDir) {
        temp.child("book/ch2/a.md").write_str("2a\n").unwrap();
        temp.child("book/ch1/b.md").write_str("1b\n").unwrap();
        temp.child("book/ch1/readme.md").write_str("1r\n").unwrap();
        temp.child("book/ch10/a.md").write_str("10a\n").unwrap();
        temp.child("book/notes/a.md").write_str("notes\n").unwrap();
    }

    fn translation(temp: &assert_fs::TempDir) {
        temp.child("good.md")
            .write_str("# 原文\n```go\nfmt.Println(\"你好\")\n```\n")
            .unwrap();
        temp.child("broken.md")
            .write_str("# Original\n```go\nfmt. Println (\"hello\")\n```\nThe end.\n")
            .unwrap();
    }

    fn create_test_config(temp: &assert_fs::TempDir) -> Config {
        Config::builder()
            .book_dir(temp.path().join("book"))
            .merged_output(temp.path().join("merged.md"))
            .reference_file(temp.path().join("good.md"))
            .broken_file(temp.path().join("broken.md"))
            .patched_output(temp.path().join("fixed.md"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_pipeline_runs_both_jobs() {
        let temp = assert_fs::TempDir::new().unwrap();
        book(&temp);
        translation(&temp);

        let stats = Pipeline::new(create_test_config(&temp))
            .unwrap()
            .run()
            .unwrap();

        temp.child("merged.md").assert("1r\n1b\n10a\n2a\n");
        temp.child("fixed.md")
            .assert("# Original\n```go\nfmt.Println(\"你好\")\n```\nThe end.\n");

        assert_eq!(stats.merge.unwrap().files, 4);
        assert_eq!(stats.patch.unwrap().regions_replaced, 1);
        assert!(!stats.dry_run);
    }

    #[test]
    fn test_pipeline_dry_run() {
        let temp = assert_fs::TempDir::new().unwrap();
        book(&temp);
        translation(&temp);

        let config = Config::builder()
            .book_dir(temp.path().join("book"))
            .merged_output(temp.path().join("merged.md"))
            .reference_file(temp.path().join("good.md"))
            .broken_file(temp.path().join("broken.md"))
            .patched_output(temp.path().join("fixed.md"))
            .dry_run(true)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert!(stats.dry_run);
        assert_eq!(stats.merge.unwrap().bytes, 13);
        assert_eq!(stats.patch.unwrap().regions_replaced, 1);
        assert!(!temp.child("merged.md").exists());
        assert!(!temp.child("fixed.md").exists());
    }

    #[test]
    fn test_pipeline_dry_run_still_detects_exhaustion() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("good.md").write_str("```\na\n```\n").unwrap();
        temp.child("broken.md")
            .write_str("```\nx\n```\n```\ny\n```\n")
            .unwrap();

        let config = Config::builder()
            .skip_merge(true)
            .reference_file(temp.path().join("good.md"))
            .broken_file(temp.path().join("broken.md"))
            .patched_output(temp.path().join("fixed.md"))
            .dry_run(true)
            .build()
            .unwrap();

        let err = Pipeline::new(config).unwrap().run().unwrap_err();
        assert!(err.is_blocks_exhausted());
    }

    #[test]
    fn test_pipeline_merge_only() {
        let temp = assert_fs::TempDir::new().unwrap();
        book(&temp);

        let config = Config::builder()
            .book_dir(temp.path().join("book"))
            .merged_output(temp.path().join("merged.md"))
            .skip_patch(true)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert!(stats.patch.is_none());
        assert!(temp.child("merged.md").exists());
    }

    #[test]
    fn test_pipeline_stops_on_first_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        book(&temp);
        temp.child("book/changelog.md").write_str("c").unwrap();
        translation(&temp);

        let err = Pipeline::new(create_test_config(&temp))
            .unwrap()
            .run()
            .unwrap_err();

        assert!(matches!(err, Error::ReadDir { .. }));
        assert!(!temp.child("fixed.md").exists());
    }

    #[test]
    fn test_pipeline_missing_reference_fails() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("broken.md").write_str("text\n").unwrap();

        let config = Config::builder()
            .skip_merge(true)
            .reference_file(temp.path().join("good.md"))
            .broken_file(temp.path().join("broken.md"))
            .patched_output(temp.path().join("fixed.md"))
            .build()
            .unwrap();

        let err = Pipeline::new(config).unwrap().run().unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_chapter_files_listing() {
        let temp = assert_fs::TempDir::new().unwrap();
        book(&temp);
        translation(&temp);

        let pipeline = Pipeline::new(create_test_config(&temp)).unwrap();
        let names: Vec<_> = pipeline
            .chapter_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["readme.md", "b.md", "a.md", "a.md"]);
    }

    #[test]
    fn test_summary_rows_share_one_width() {
        let stats = PipelineStats {
            merge: Some(MergeStats {
                files: 12,
                bytes: 4096,
                output: "/very/long/path/to/some/book/output/directory/merged-book.md".to_string(),
            }),
            patch: Some(SpliceStats {
                available_blocks: 3,
                regions_replaced: 2,
                unused_blocks: 1,
                lines_copied: 40,
                unterminated_at: Some(17),
            }),
            dry_run: true,
            duration: Duration::from_millis(1234),
        };

        let summary = stats.summary();
        let widths: Vec<usize> = summary.lines().map(|l| l.chars().count()).collect();

        assert_eq!(widths.len(), 14);
        assert!(widths.iter().all(|&w| w == 57), "{summary}");
        assert!(summary.lines().skip(1).all(|l| l.ends_with('║') || l.ends_with('╣') || l.ends_with('╝')));
        assert!(summary.contains("…"));
        assert!(summary.contains("merged-book.md"));
    }

    #[test]
    fn test_fit_width_keeps_short_text() {
        assert_eq!(fit_width("merged.md", 49), "merged.md");
        assert_eq!(fit_width("abcdef", 4), "…def");
    }

    #[test]
    fn test_stats_to_json() {
        let stats = PipelineStats {
            merge: None,
            patch: Some(SpliceStats {
                available_blocks: 2,
                regions_replaced: 2,
                ..SpliceStats::default()
            }),
            dry_run: false,
            duration: Duration::from_millis(5),
        };

        let json = stats.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["merge"].is_null());
        assert_eq!(value["patch"]["regions_replaced"], 2);
    }
}
