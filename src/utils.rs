use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use tokio::fs;
use url::Url;

/// Writes next to `path` first and renames into place, so a crash never
/// leaves a truncated artifact that would pass the existence check.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension(format!(
        "{}part",
        path.extension().and_then(|s| s.to_str()).unwrap_or("")
    ));
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await
}

/// Transliterated to ASCII, lowercase, words joined by single dashes.
pub fn slugify(name: &str) -> String {
    slug::slugify(name)
}

/// `<save_root>/<slug of name>`. Fails when the slug is empty.
pub fn comic_dir(save_root: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let slug = slugify(name);
    if slug.is_empty() {
        bail!("comic name {name:?} yields an empty directory name, pass --name");
    }
    Ok(save_root.join(slug))
}

/// Last non-empty path segment of the comic URL.
pub fn comic_name_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_owned)
}

pub fn format_elapsed(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms >= 60_000 {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;
        if ms_remaining > 0 {
            format!("{}s {}ms", secs, ms_remaining)
        } else {
            format!("{}s", secs)
        }
    } else {
        format!("{}ms", total_ms)
    }
}
