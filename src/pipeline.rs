use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{error, info, instrument};

use crate::config::AssemblySettings;
use crate::crawler::{ChapterId, Fetch, fetch_images};
use crate::document::{Assembly, PageAssembler};
use crate::site::SiteRule;

/// Read-only state shared by every chapter of a run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub rule: SiteRule,
    pub assembler: PageAssembler,
}

impl PipelineContext {
    pub fn new(rule: SiteRule, assembly: &AssemblySettings) -> Self {
        Self {
            rule,
            assembler: PageAssembler::new(assembly),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTask {
    pub id: ChapterId,
    pub url: String,
    pub save_root: PathBuf,
}

impl ChapterTask {
    pub fn new(id: ChapterId, url: impl Into<String>, save_root: impl Into<PathBuf>) -> Self {
        Self {
            id,
            url: url.into(),
            save_root: save_root.into(),
        }
    }

    /// Its existence marks the chapter as done.
    pub fn artifact_path(&self) -> PathBuf {
        self.save_root.join(format!("Chapter-{}.pdf", self.id))
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.save_root.join(format!("Chapter{}_Images", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// The artifact was already there.
    Skipped,
    Saved {
        path: PathBuf,
        pages: usize,
        downloaded: usize,
        requested: usize,
    },
    /// Nothing usable on the chapter page; no artifact.
    Empty { downloaded: usize, requested: usize },
}

/// Download directory of one chapter, removed when dropped.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Starts from an empty directory, discarding leftovers of an
    /// interrupted run.
    async fn recreate(path: PathBuf) -> Result<Self> {
        if fs::try_exists(&path).await? {
            fs::remove_dir_all(&path)
                .await
                .with_context(|| format!("clearing {}", path.display()))?;
        }
        fs::create_dir_all(&path)
            .await
            .with_context(|| format!("creating {}", path.display()))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Fetch, assemble and clean up one chapter.
///
/// Returns before touching the network when the artifact exists. The
/// scratch directory is removed on every exit path.
#[instrument(skip_all, fields(chapter = task.id))]
pub async fn process<F: Fetch>(
    ctx: &PipelineContext,
    fetcher: Arc<F>,
    task: &ChapterTask,
) -> Result<ChapterOutcome> {
    let artifact = task.artifact_path();
    if fs::try_exists(&artifact).await? {
        info!(path = %artifact.display(), "already saved, skipping");
        return Ok(ChapterOutcome::Skipped);
    }

    let scratch = ScratchDir::recreate(task.scratch_dir()).await?;
    let (downloaded, requested) = fetch_images(fetcher, &task.url, &ctx.rule, scratch.path())
        .await?
        .into_tally();

    let outcome = match ctx.assembler.assemble(scratch.path(), &artifact).await? {
        Assembly::Written { path, pages } => ChapterOutcome::Saved {
            path,
            pages,
            downloaded,
            requested,
        },
        Assembly::Empty => {
            info!(requested, "chapter has no usable pages");
            ChapterOutcome::Empty {
                downloaded,
                requested,
            }
        }
    };
    drop(scratch);
    Ok(outcome)
}
