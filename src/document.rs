pub mod natural;
pub mod page;
pub mod writer;

pub use natural::{natural_cmp, sort_naturally};
pub use page::{load_page, normalize};
pub use writer::PdfWriter;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tokio::task;
use tracing::{info, instrument, warn};

use crate::config::AssemblySettings;
use crate::utils::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    Written { path: PathBuf, pages: usize },
    /// No usable page survived filtering; nothing was written.
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct PageAssembler {
    min_page_height: u32,
    writer: PdfWriter,
}

impl PageAssembler {
    pub fn new(settings: &AssemblySettings) -> Self {
        Self {
            min_page_height: settings.min_page_height,
            writer: PdfWriter::new(settings.resolution, settings.jpeg_quality),
        }
    }

    /// Files of `dir` in natural filename order.
    pub async fn page_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir)
            .await
            .with_context(|| format!("reading {}", dir.display()))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        sort_naturally(&mut names);
        Ok(names.into_iter().map(|name| dir.join(name)).collect())
    }

    /// Builds the artifact at `artifact` from the images in `dir`.
    ///
    /// Page order is fixed from the file names before decoding starts; files
    /// are decoded in parallel on the blocking pool.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub async fn assemble(&self, dir: &Path, artifact: &Path) -> Result<Assembly> {
        let files = Self::page_files(dir).await?;

        let min_height = self.min_page_height;
        let handles: Vec<_> = files
            .into_iter()
            .map(|path| task::spawn_blocking(move || load_page(&path, min_height)))
            .collect();

        let mut pages = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(page)) => pages.push(page),
                Ok(None) => {}
                Err(e) => warn!("page decoding aborted: {}", e),
            }
        }

        if pages.is_empty() {
            info!("no usable pages");
            return Ok(Assembly::Empty);
        }

        let writer = self.writer;
        let count = pages.len();
        let pdf = task::spawn_blocking(move || writer.render(&pages)).await??;
        write_atomic(artifact, &pdf).await?;

        info!(pages = count, path = %artifact.display(), "chapter saved");
        Ok(Assembly::Written {
            path: artifact.to_path_buf(),
            pages: count,
        })
    }
}
