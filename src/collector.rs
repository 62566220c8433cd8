use crate::{
    config::Config,
    error::{Error, Result},
};
use std::{
    cmp::Ordering,
    ffi::{OsStr, OsString},
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Collects the chapter files of a book in merge order.
///
/// Chapters are the entries directly under the book root whose name starts
/// with the chapter prefix, ordered by name. Files inside a chapter are
/// ordered by name, except the readme which always comes first.
#[derive(Debug, Clone)]
pub struct ChapterCollector {
    book_dir: PathBuf,
    chapter_prefix: String,
    readme_name: OsString,
}

impl ChapterCollector {
    /// Creates a collector using the `ch` prefix and `readme.md` as readme.
    #[must_use]
    pub fn new(book_dir: impl Into<PathBuf>) -> Self {
        let defaults = Config::default();
        Self {
            book_dir: book_dir.into(),
            chapter_prefix: defaults.chapter_prefix,
            readme_name: defaults.readme_name.into(),
        }
    }

    /// Creates a collector from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            book_dir: config.book_dir.clone(),
            chapter_prefix: config.chapter_prefix.clone(),
            readme_name: config.readme_name.clone().into(),
        }
    }

    /// Returns the book root this collector walks.
    #[must_use]
    pub fn book_dir(&self) -> &Path {
        &self.book_dir
    }

    /// Returns the full paths of all chapter files, in merge order.
    ///
    /// # Errors
    ///
    /// Returns an error if the book root or any chapter entry cannot be
    /// listed. A root or chapter-prefixed entry that is not a directory
    /// cannot be listed either.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        debug!("Collecting chapters under {}", self.book_dir.display());

        let mut files = Vec::new();
        for chapter in self.chapters()? {
            let chapter_files = self.chapter_files(&chapter)?;
            debug!(
                "Chapter {}: {} file(s)",
                chapter.file_name().to_string_lossy(),
                chapter_files.len()
            );
            files.extend(chapter_files);
        }

        debug!("Collected {} chapter files", files.len());
        Ok(files)
    }

    /// Lists the chapter entries of the book root, sorted by name.
    fn chapters(&self) -> Result<Vec<DirEntry>> {
        let prefix = self.chapter_prefix.as_bytes();

        let chapters: Vec<DirEntry> = list_dir(
            &self.book_dir,
            WalkDir::new(&self.book_dir).sort_by_file_name(),
        )?
        .into_iter()
        .filter(|entry| {
            let keep = entry.file_name().as_encoded_bytes().starts_with(prefix);
            if !keep {
                trace!("Skipping non-chapter entry: {}", entry.path().display());
            }
            keep
        })
        .collect();

        Ok(chapters)
    }

    /// Lists the files of one chapter, readme first.
    fn chapter_files(&self, chapter: &DirEntry) -> Result<Vec<PathBuf>> {
        let path = chapter.path();
        let readme = self.readme_name.clone();
        let walker = WalkDir::new(path)
            .sort_by(move |a, b| chapter_file_order(&readme, a.file_name(), b.file_name()));

        let mut files = Vec::new();
        for entry in list_dir(path, walker)? {
            if entry.path().is_dir() {
                debug!("Skipping nested directory: {}", entry.path().display());
                continue;
            }
            trace!("Chapter file: {}", entry.path().display());
            files.push(entry.into_path());
        }

        Ok(files)
    }
}

/// Runs a single-level walk over `dir`, yielding its immediate entries.
///
/// `dir` itself may be a symlink to a directory. Entries are not followed,
/// so a dangling link only fails once something tries to read it.
fn list_dir(dir: &Path, walker: WalkDir) -> Result<Vec<DirEntry>> {
    let metadata = fs::metadata(dir).map_err(|e| Error::read_dir(dir, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(Error::read_dir(dir, "not a directory"));
    }

    walker
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .map(|entry| entry.map_err(|e| Error::read_dir(dir, e.to_string())))
        .collect()
}

/// Orders chapter files by name with the readme forced to the front.
fn chapter_file_order(readme: &OsStr, a: &OsStr, b: &OsStr) -> Ordering {
    match (a == readme, b == readme) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.cmp(b),
    }
}
