use anyhow::Context;
use clap::Parser;
use mdbook_stitch::{Config, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "mdbook-stitch",
    version,
    author,
    about = "Merge book chapters and restore broken code blocks in translated markdown",
    long_about = "Merge book chapters and restore broken code blocks in translated markdown.\n\n\
    The merge job concatenates every file of every `ch*` folder of a book into one \
    document. The patch job copies the fenced code blocks of a reference file, in \
    order, over the fenced code blocks of a translated file.\n\n\
    USAGE EXAMPLES:\n  \
      # Merge a book and patch the default files in the current directory\n  \
      mdbook-stitch --book ./my-book\n\n  \
      # Only merge\n  \
      mdbook-stitch --book ./my-book --merged book.md --skip-patch\n\n  \
      # Only patch, reporting what would change\n  \
      mdbook-stitch --skip-merge --reference zh.md --broken en.md --patched en-fixed.md --dry-run"
)]
struct Cli {
    /// Book root containing the `ch*` chapter folders
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    book: PathBuf,

    /// Output file for the merged chapters
    #[arg(short, long, default_value = "merged.md", value_name = "FILE")]
    merged: PathBuf,

    /// Markdown file with the good code blocks
    #[arg(short, long, default_value = "chinese-good-code.md", value_name = "FILE")]
    reference: PathBuf,

    /// Markdown file whose code blocks are broken
    #[arg(long, default_value = "english-broken-code.md", value_name = "FILE")]
    broken: PathBuf,

    /// Output file for the patched markdown
    #[arg(short, long, default_value = "english-good-code.md", value_name = "FILE")]
    patched: PathBuf,

    /// Prefix selecting chapter folders
    #[arg(long, default_value = "ch")]
    chapter_prefix: String,

    /// File always placed first inside a chapter
    #[arg(long, default_value = "readme.md")]
    readme: String,

    /// Don't run the merge job
    #[arg(long)]
    skip_merge: bool,

    /// Don't run the patch job
    #[arg(long)]
    skip_patch: bool,

    /// Dry run (don't write files)
    #[arg(long)]
    dry_run: bool,

    /// Print run statistics as JSON instead of the summary table
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let config = Config::builder()
        .book_dir(cli.book)
        .merged_output(cli.merged)
        .reference_file(cli.reference)
        .broken_file(cli.broken)
        .patched_output(cli.patched)
        .chapter_prefix(cli.chapter_prefix)
        .readme_name(cli.readme)
        .skip_merge(cli.skip_merge)
        .skip_patch(cli.skip_patch)
        .dry_run(cli.dry_run)
        .build()
        .context("Failed to build configuration")?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Pipeline execution failed")?;

    if cli.json {
        println!("{}", stats.to_json().context("Failed to render statistics")?);
    } else {
        stats.print_summary();
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("mdbook_stitch=info"),
        1 => EnvFilter::new("mdbook_stitch=debug"),
        _ => EnvFilter::new("mdbook_stitch=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
