use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Result, anyhow};
use tokio::runtime;
use tracing::{error, info, instrument, warn};

use crate::config::{AssemblySettings, Settings};
use crate::crawler::{ChapterGap, ChapterId, ChapterIndex, ChapterRange, Fetch, HttpFetcher};
use crate::pipeline::{self, ChapterOutcome, ChapterTask, PipelineContext};
use crate::site::Site;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub url: String,
    /// Chapters `1..=n`; wins over `range`.
    pub num_chapters: Option<ChapterId>,
    pub range: ChapterRange,
    /// `None` means one worker per available core.
    pub workers: Option<usize>,
    /// Directory receiving the artifacts; must exist.
    pub save_root: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub saved: usize,
    pub skipped: usize,
    pub empty: usize,
    pub failed: Vec<ChapterId>,
    pub gap: Option<ChapterGap>,
}

impl FleetSummary {
    fn record(&mut self, id: ChapterId, result: Result<ChapterOutcome>) {
        match result {
            Ok(ChapterOutcome::Saved {
                pages,
                downloaded,
                requested,
                ..
            }) => {
                info!(chapter = id, pages, downloaded, requested, "chapter done");
                self.saved += 1;
            }
            Ok(ChapterOutcome::Empty { requested, .. }) => {
                warn!(chapter = id, requested, "chapter produced no pages");
                self.empty += 1;
            }
            Ok(ChapterOutcome::Skipped) => self.skipped += 1,
            Err(e) => {
                error!(chapter = id, "chapter failed: {:#}", e);
                self.failed.push(id);
            }
        }
    }
}

pub fn host_parallelism() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Requested workers capped at `capacity`; unset or zero means `capacity`.
pub fn worker_count(requested: Option<usize>, capacity: usize) -> usize {
    let capacity = capacity.max(1);
    match requested {
        Some(n) if n > 0 => n.min(capacity),
        _ => capacity,
    }
}

/// Downloads every selected chapter of the comic at `options.url`.
pub fn run(options: &RunOptions, settings: &Settings) -> Result<FleetSummary> {
    let http = settings.http.clone();
    run_with(options, &settings.assembly, move || {
        HttpFetcher::new(&http).map_err(Into::into)
    })
}

/// [`run`] with a caller-supplied network layer. `make_fetcher` is called
/// once for the index and once per processed chapter, so chapters never
/// share connections.
#[instrument(skip_all, fields(url = %options.url))]
pub fn run_with<F, M>(
    options: &RunOptions,
    assembly: &AssemblySettings,
    make_fetcher: M,
) -> Result<FleetSummary>
where
    F: Fetch,
    M: Fn() -> Result<F> + Sync,
{
    let site = Site::detect(&options.url)?;
    let url = site.normalize_url(&options.url);
    let rule = site.rule();

    let index = runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let fetcher = make_fetcher()?;
            Ok::<_, anyhow::Error>(ChapterIndex::build(&fetcher, &url, &rule).await?)
        })?;

    let gap = index.gap();
    if let Some(gap) = &gap {
        warn!(
            missing = gap.missing_count,
            "{} missing chapter/s on {}: {:?}",
            gap.missing_count,
            url,
            gap.missing
        );
    }

    let range = ChapterRange::new(
        options.num_chapters,
        options.range.start,
        options.range.end,
    );
    let tasks: Vec<ChapterTask> = index
        .filter(&range)
        .iter()
        .map(|(id, chapter_url)| ChapterTask::new(id, chapter_url, &options.save_root))
        .collect();

    let mut summary = FleetSummary {
        gap,
        ..Default::default()
    };
    if tasks.is_empty() {
        info!("no chapters selected");
        return Ok(summary);
    }

    let ctx = PipelineContext::new(rule, assembly);
    let workers = worker_count(options.workers, host_parallelism()).min(tasks.len());
    let decode_threads = assembly.decode_threads.unwrap_or_else(host_parallelism).max(1);
    info!(chapters = tasks.len(), workers, "starting chapter workers");

    let (task_tx, task_rx) = crossbeam_channel::unbounded::<ChapterTask>();
    let (done_tx, done_rx) = crossbeam_channel::unbounded();
    for task in tasks {
        task_tx.send(task)?;
    }
    drop(task_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let task_rx = task_rx.clone();
            let done_tx = done_tx.clone();
            let ctx = &ctx;
            let make_fetcher = &make_fetcher;
            scope.spawn(move || {
                for task in task_rx.iter() {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        run_chapter(ctx, &task, make_fetcher, decode_threads)
                    }))
                    .unwrap_or_else(|_| Err(anyhow!("chapter worker panicked")));
                    // The receiver lives until the scope ends.
                    let _ = done_tx.send((task.id, result));
                }
            });
        }
    });
    drop(done_tx);

    for (id, result) in done_rx.iter() {
        summary.record(id, result);
    }
    info!(
        saved = summary.saved,
        skipped = summary.skipped,
        empty = summary.empty,
        failed = summary.failed.len(),
        "run finished"
    );
    Ok(summary)
}

/// One chapter on its own single-threaded runtime and connection pool.
fn run_chapter<F, M>(
    ctx: &PipelineContext,
    task: &ChapterTask,
    make_fetcher: &M,
    decode_threads: usize,
) -> Result<ChapterOutcome>
where
    F: Fetch,
    M: Fn() -> Result<F>,
{
    let runtime = runtime::Builder::new_current_thread()
        .enable_all()
        .max_blocking_threads(decode_threads)
        .build()?;
    runtime.block_on(async {
        let fetcher = Arc::new(make_fetcher()?);
        pipeline::process(ctx, fetcher, task).await
    })
}
