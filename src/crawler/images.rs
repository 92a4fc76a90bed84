use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::crawler::parser;
use crate::crawler::{Fetch, TaskManager};
use crate::site::SiteRule;

const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Position of the image in the chapter page.
    pub position: usize,
    pub payload: Option<Bytes>,
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        self.payload.is_some()
    }
}

/// Outcome of one chapter's download phase, ordered by position.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub results: Vec<DownloadResult>,
}

impl DownloadReport {
    pub fn requested(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.requested() - self.succeeded()
    }

    /// `(succeeded, requested)`. Consumes the report so the payloads are
    /// released once the files are on disk.
    pub fn into_tally(self) -> (usize, usize) {
        (self.succeeded(), self.requested())
    }
}

/// `images<position+1>.<ext>`, extension taken from the URL path.
pub fn image_filename(position: usize, url: &str) -> String {
    let extension = Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
        })
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned());
    format!("images{}.{}", position + 1, extension)
}

/// Downloads every image of a chapter page into `dest_dir`.
///
/// Only a failure to load the chapter page itself is an error. Individual
/// images that fail are logged and reported as absent.
#[instrument(skip_all, fields(chapter = chapter_url))]
pub async fn fetch_images<F: Fetch>(
    fetcher: Arc<F>,
    chapter_url: &str,
    rule: &SiteRule,
    dest_dir: &Path,
) -> Result<DownloadReport> {
    let base = Url::parse(chapter_url)?;
    let html = fetcher.text(chapter_url).await?;
    let urls = parser::image_urls(&html, rule, &base);
    info!(images = urls.len(), "downloading chapter images");

    let mut tasks = TaskManager::new();
    for (position, url) in urls.iter().cloned().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        let path = dest_dir.join(image_filename(position, &url));
        tasks.spawn(async move {
            let payload = match download_one(fetcher.as_ref(), &url, &path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(url = %url, "image download failed: {:#}", e);
                    None
                }
            };
            DownloadResult { position, payload }
        });
    }

    let mut results: Vec<DownloadResult> = (0..urls.len())
        .map(|position| DownloadResult {
            position,
            payload: None,
        })
        .collect();
    for settled in tasks.settle().await {
        match settled {
            Ok(result) => {
                let position = result.position;
                results[position] = result;
            }
            Err(e) => error!("image download task aborted: {}", e),
        }
    }

    let report = DownloadReport { results };
    if report.succeeded() < report.requested() {
        warn!(
            requested = report.requested(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Total {} images downloaded out of {}",
            report.succeeded(),
            report.requested()
        );
    }
    Ok(report)
}

async fn download_one<F: Fetch + ?Sized>(fetcher: &F, url: &str, path: &Path) -> Result<Bytes> {
    let bytes = fetcher.bytes(url).await?;
    fs::write(path, &bytes).await?;
    debug!(path = %path.display(), size = bytes.len(), "image saved");
    Ok(bytes)
}
