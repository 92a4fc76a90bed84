use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use webtoonsaver::crawler::{ChapterId, ChapterRange};
use webtoonsaver::utils::{comic_dir, comic_name_from_url, format_elapsed};
use webtoonsaver::{RunOptions, Settings, logger};

#[derive(Parser, Debug)]
#[command(name = "webtoonsaver")]
#[command(about = "Save web comic chapters as one PDF per chapter", long_about = None)]
struct Cli {
    /// Index page of the comic
    url: String,

    /// Comic name used for the output directory (defaults to the last URL segment)
    #[arg(long)]
    name: Option<String>,

    /// Parent directory for comics (overrides `save_root` from the config)
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// Only chapters 1..=N; overrides --start/--end
    #[arg(long, short = 'n')]
    num_chapters: Option<ChapterId>,

    /// First chapter to save (inclusive)
    #[arg(long)]
    start: Option<ChapterId>,

    /// Last chapter to save (inclusive)
    #[arg(long)]
    end: Option<ChapterId>,

    /// Parallel chapter workers, capped at the number of cores
    #[arg(long, short = 'j')]
    workers: Option<usize>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let name = cli
        .name
        .clone()
        .or_else(|| comic_name_from_url(&cli.url))
        .context("cannot derive a comic name from the url, pass --name")?;
    let parent = cli
        .save_path
        .clone()
        .unwrap_or_else(|| settings.save_root.clone());
    let save_root = comic_dir(&parent, &name)?;
    std::fs::create_dir_all(&save_root)
        .with_context(|| format!("creating {}", save_root.display()))?;

    let options = RunOptions {
        url: cli.url,
        num_chapters: cli.num_chapters,
        range: ChapterRange {
            start: cli.start,
            end: cli.end,
        },
        workers: cli.workers.or(settings.workers),
        save_root,
    };

    info!(comic = %name, path = %options.save_root.display(), "saving comic");
    let start = Instant::now();
    let summary = webtoonsaver::run(&options, &settings)?;

    info!(
        saved = summary.saved,
        skipped = summary.skipped,
        empty = summary.empty,
        failed = ?summary.failed,
        "done in {}",
        format_elapsed(start.elapsed())
    );
    Ok(())
}
