use crate::error::{Error, Result};
use std::{
    fs,
    path::{self, Component, Path, PathBuf},
};

const DEFAULT_CHAPTER_PREFIX: &str = "ch";
const DEFAULT_README_NAME: &str = "readme.md";
const DEFAULT_MERGED_OUTPUT: &str = "merged.md";
const DEFAULT_REFERENCE_FILE: &str = "chinese-good-code.md";
const DEFAULT_BROKEN_FILE: &str = "english-broken-code.md";
const DEFAULT_PATCHED_OUTPUT: &str = "english-good-code.md";

/// Configuration for the mdbook-stitch pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Book root containing the chapter directories
    pub book_dir: PathBuf,

    /// File the merged chapters are written to
    pub merged_output: PathBuf,

    /// Markdown file holding the known-good code blocks
    pub reference_file: PathBuf,

    /// Markdown file whose code blocks get replaced
    pub broken_file: PathBuf,

    /// File the patched markdown is written to
    pub patched_output: PathBuf,

    /// Name prefix selecting chapter directories
    pub chapter_prefix: String,

    /// File name always ordered first inside a chapter
    pub readme_name: String,

    /// Run the chapter merge job
    pub merge_enabled: bool,

    /// Run the code block patch job
    pub patch_enabled: bool,

    /// Dry run mode (no file writes)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdbook_stitch::Config;
    ///
    /// let config = Config::builder()
    ///     .book_dir(".")
    ///     .skip_patch(true)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Both jobs are disabled
    /// - Book directory doesn't exist or is not a directory
    /// - Chapter prefix or readme name is empty
    /// - The merged output lands inside a chapter directory
    /// - An output path is the same as one of the inputs it is built from
    ///
    /// Paths are compared after resolving `.`, `..` and symlinks, so
    /// `./post.md` and `post.md` name the same file.
    pub fn validate(&self) -> Result<()> {
        if !self.merge_enabled && !self.patch_enabled {
            return Err(Error::config("Nothing to do: both merge and patch are disabled"));
        }

        if self.merge_enabled {
            if !self.book_dir.exists() {
                return Err(Error::config(format!(
                    "Book directory does not exist: {}",
                    self.book_dir.display()
                )));
            }

            if !self.book_dir.is_dir() {
                return Err(Error::config(format!(
                    "Book path is not a directory: {}",
                    self.book_dir.display()
                )));
            }

            if self.chapter_prefix.is_empty() {
                return Err(Error::config("chapter_prefix must not be empty"));
            }

            if self.readme_name.is_empty() {
                return Err(Error::config("readme_name must not be empty"));
            }

            if let Some(chapter) = self.chapter_of(&self.merged_output) {
                return Err(Error::config(format!(
                    "merged_output is inside chapter {chapter} and would be merged into itself: {}",
                    self.merged_output.display()
                )));
            }
        }

        if self.patch_enabled {
            let output = resolve(&self.patched_output);
            for input in [&self.reference_file, &self.broken_file] {
                if resolve(input) == output {
                    return Err(Error::config(format!(
                        "patched_output would overwrite its own input: {}",
                        input.display()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Returns the chapter directory name `path` would be collected from.
    fn chapter_of(&self, path: &Path) -> Option<String> {
        let book = fs::canonicalize(&self.book_dir).ok()?;
        let resolved = resolve(path);
        let mut components = resolved.parent()?.strip_prefix(&book).ok()?.components();

        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None)
                if name
                    .as_encoded_bytes()
                    .starts_with(self.chapter_prefix.as_bytes()) =>
            {
                Some(name.to_string_lossy().into_owned())
            }
            _ => None,
        }
    }
}

/// Resolves `path` to an absolute form suitable for comparing file identity.
///
/// Existing paths are canonicalized. A path that does not exist yet keeps its
/// file name under its canonicalized parent.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    let absolute = path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map_or_else(|_| absolute.clone(), |parent| parent.join(name)),
        _ => absolute,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            book_dir: PathBuf::from("."),
            merged_output: PathBuf::from(DEFAULT_MERGED_OUTPUT),
            reference_file: PathBuf::from(DEFAULT_REFERENCE_FILE),
            broken_file: PathBuf::from(DEFAULT_BROKEN_FILE),
            patched_output: PathBuf::from(DEFAULT_PATCHED_OUTPUT),
            chapter_prefix: DEFAULT_CHAPTER_PREFIX.to_string(),
            readme_name: DEFAULT_README_NAME.to_string(),
            merge_enabled: true,
            patch_enabled: true,
            dry_run: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    book_dir: Option<PathBuf>,
    merged_output: Option<PathBuf>,
    reference_file: Option<PathBuf>,
    broken_file: Option<PathBuf>,
    patched_output: Option<PathBuf>,
    chapter_prefix: Option<String>,
    readme_name: Option<String>,
    skip_merge: bool,
    skip_patch: bool,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the book root directory.
    #[must_use]
    pub fn book_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.book_dir = Some(path.into());
        self
    }

    /// Sets the merged output file.
    #[must_use]
    pub fn merged_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.merged_output = Some(path.into());
        self
    }

    /// Sets the reference markdown file (good code blocks).
    #[must_use]
    pub fn reference_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_file = Some(path.into());
        self
    }

    /// Sets the markdown file with broken code blocks.
    #[must_use]
    pub fn broken_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.broken_file = Some(path.into());
        self
    }

    /// Sets the patched output file.
    #[must_use]
    pub fn patched_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.patched_output = Some(path.into());
        self
    }

    /// Sets the prefix selecting chapter directories.
    #[must_use]
    pub fn chapter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.chapter_prefix = Some(prefix.into());
        self
    }

    /// Sets the file name forced to the front of each chapter.
    #[must_use]
    pub fn readme_name(mut self, name: impl Into<String>) -> Self {
        self.readme_name = Some(name.into());
        self
    }

    /// Disables the chapter merge job.
    #[must_use]
    pub fn skip_merge(mut self, skip: bool) -> Self {
        self.skip_merge = skip;
        self
    }

    /// Disables the code block patch job.
    #[must_use]
    pub fn skip_patch(mut self, skip: bool) -> Self {
        self.skip_patch = skip;
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();

        let config = Config {
            book_dir: self.book_dir.unwrap_or(defaults.book_dir),
            merged_output: self.merged_output.unwrap_or(defaults.merged_output),
            reference_file: self.reference_file.unwrap_or(defaults.reference_file),
            broken_file: self.broken_file.unwrap_or(defaults.broken_file),
            patched_output: self.patched_output.unwrap_or(defaults.patched_output),
            chapter_prefix: self.chapter_prefix.unwrap_or(defaults.chapter_prefix),
            readme_name: self.readme_name.unwrap_or(defaults.readme_name),
            merge_enabled: !self.skip_merge,
            patch_enabled: !self.skip_patch,
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}
