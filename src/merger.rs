use crate::error::{Error, Result};
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, trace};

/// Statistics for one merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeStats {
    /// Number of files concatenated
    pub files: usize,

    /// Total bytes written
    pub bytes: u64,

    /// Merged output path
    pub output: String,
}

/// Concatenates files into a single output file.
#[derive(Debug, Clone)]
pub struct Merger {
    output: PathBuf,
}

impl Merger {
    /// Creates a merger writing to `output`.
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// Returns the output path.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Writes the raw bytes of every file, in order, with nothing in between.
    ///
    /// The output is created or truncated first. If an input cannot be read
    /// the merge stops and whatever was written so far stays on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The output file cannot be created or written
    /// - Any input file cannot be read
    pub fn merge(&self, files: &[PathBuf]) -> Result<MergeStats> {
        let file = fs::File::create(&self.output).map_err(|e| Error::io(&self.output, e))?;
        let mut writer = BufWriter::new(file);

        info!("Merging {} files into {}", files.len(), self.output.display());

        let mut bytes = 0u64;
        for path in files {
            let data = fs::read(path).map_err(|e| Error::io(path, e))?;
            writer
                .write_all(&data)
                .map_err(|e| Error::io(&self.output, e))?;
            trace!("Appended {} ({} bytes)", path.display(), data.len());
            bytes += data.len() as u64;
        }

        writer.flush().map_err(|e| Error::io(&self.output, e))?;

        debug!("Merged {} bytes into {}", bytes, self.output.display());
        Ok(self.stats(files.len(), bytes))
    }

    /// Reports what [`Merger::merge`] would write, without writing.
    ///
    /// # Errors
    ///
    /// Returns an error if an input file's metadata cannot be read.
    pub fn measure(&self, files: &[PathBuf]) -> Result<MergeStats> {
        let mut bytes = 0u64;
        for path in files {
            let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
            bytes += metadata.len();
        }
        Ok(self.stats(files.len(), bytes))
    }

    fn stats(&self, files: usize, bytes: u64) -> MergeStats {
        MergeStats {
            files,
            bytes,
            output: self.output.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_merge_concatenates_without_separator() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("A").write_str("X\n").unwrap();
        temp.child("B").write_str("Y\n").unwrap();
        let out = temp.child("merged.md");

        let merger = Merger::new(out.path());
        let stats = merger
            .merge(&[temp.path().join("A"), temp.path().join("B")])
            .unwrap();

        out.assert("X\nY\n");
        assert_eq!(stats.files, 2);
        assert_eq!(stats.bytes, 4);
    }

    #[test]
    fn test_merge_keeps_raw_bytes() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("no trailing newline").unwrap();
        temp.child("b.md").write_str("\r\nwindows line\r\n").unwrap();
        let out = temp.child("merged.md");

        Merger::new(out.path())
            .merge(&[temp.path().join("a.md"), temp.path().join("b.md")])
            .unwrap();

        out.assert("no trailing newline\r\nwindows line\r\n");
    }

    #[test]
    fn test_merge_overwrites_existing_output() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("new").unwrap();
        let out = temp.child("merged.md");
        out.write_str("old content that is longer").unwrap();

        Merger::new(out.path())
            .merge(&[temp.path().join("a.md")])
            .unwrap();

        out.assert("new");
    }

    #[test]
    fn test_merge_empty_list_creates_empty_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let out = temp.child("merged.md");

        let stats = Merger::new(out.path()).merge(&[]).unwrap();

        out.assert("");
        assert_eq!(stats.files, 0);
    }

    #[test]
    fn test_merge_missing_input_fails() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("a").unwrap();
        let missing = temp.path().join("missing.md");

        let result = Merger::new(temp.path().join("merged.md"))
            .merge(&[temp.path().join("a.md"), missing.clone()]);

        match result {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_uncreatable_output_fails() {
        let temp = assert_fs::TempDir::new().unwrap();
        let out = temp.path().join("no/such/dir/merged.md");

        let result = Merger::new(&out).merge(&[]);
        assert!(result.unwrap_err().is_io());
    }

    #[test]
    fn test_measure_does_not_write() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("abc").unwrap();
        let out = temp.child("merged.md");

        let stats = Merger::new(out.path())
            .measure(&[temp.path().join("a.md")])
            .unwrap();

        assert_eq!(stats.bytes, 3);
        assert!(!out.path().exists());
    }
}
