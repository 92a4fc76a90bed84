use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, instrument, warn};
use url::Url;

use crate::crawler::Fetch;
use crate::crawler::parser;
use crate::error::{Result, SaverError};
use crate::site::SiteRule;

pub type ChapterId = u64;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern"));

/// First run of digits in a chapter URL.
pub fn parse_chapter_id(url: &str) -> Option<ChapterId> {
    DIGITS.find(url).and_then(|m| m.as_str().parse().ok())
}

/// Chapters in discovery order. Identifiers are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterIndex {
    entries: Vec<(ChapterId, String)>,
}

impl ChapterIndex {
    /// Fetches the index page and collects its chapter links.
    #[instrument(skip_all, fields(url = index_url))]
    pub async fn build<F: Fetch + ?Sized>(
        fetcher: &F,
        index_url: &str,
        rule: &SiteRule,
    ) -> Result<Self> {
        let base = Url::parse(index_url).map_err(|source| SaverError::InvalidUrl {
            url: index_url.to_owned(),
            source,
        })?;
        let html = fetcher.text(index_url).await?;
        let links = parser::chapter_links(&html, rule, &base);

        let mut index = ChapterIndex::default();
        for link in links {
            match parse_chapter_id(&link.href) {
                Some(id) => index.insert(id, link.url),
                None if DIGITS.is_match(&link.href) => {
                    warn!(href = %link.href, "chapter number out of range, skipped")
                }
                None => warn!("{}", SaverError::MissingChapterId(link.href)),
            }
        }
        info!(chapters = index.len(), "chapter index built");
        Ok(index)
    }

    /// A repeated identifier keeps its first position and takes the newer URL.
    pub fn insert(&mut self, id: ChapterId, url: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = url,
            None => self.entries.push((id, url)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChapterId, &str)> {
        self.entries.iter().map(|(id, url)| (*id, url.as_str()))
    }

    pub fn ids(&self) -> impl Iterator<Item = ChapterId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Chapters that look missing from the listing, or `None` when the
    /// listing is complete.
    ///
    /// The expected count is the highest identifier; the reported list covers
    /// the holes between the lowest and highest identifiers found. Both are
    /// computed from values, so the listing order of a site does not matter.
    pub fn gap(&self) -> Option<ChapterGap> {
        let min = self.ids().min()?;
        let max = self.ids().max()?;
        let missing_count = max.saturating_sub(self.len() as u64);
        if missing_count == 0 {
            return None;
        }

        let found: BTreeSet<_> = self.ids().collect();
        let missing = (min..=max).filter(|id| !found.contains(id)).collect();
        Some(ChapterGap {
            missing_count,
            missing,
        })
    }

    pub fn filter(&self, range: &ChapterRange) -> ChapterIndex {
        ChapterIndex {
            entries: self
                .entries
                .iter()
                .filter(|(id, _)| range.contains(*id))
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<(ChapterId, String)> for ChapterIndex {
    fn from_iter<T: IntoIterator<Item = (ChapterId, String)>>(iter: T) -> Self {
        let mut index = ChapterIndex::default();
        for (id, url) in iter {
            index.insert(id, url);
        }
        index
    }
}

/// Discovery gap. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterGap {
    pub missing_count: u64,
    pub missing: Vec<ChapterId>,
}

/// Inclusive bounds; either may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChapterRange {
    pub start: Option<ChapterId>,
    pub end: Option<ChapterId>,
}

impl ChapterRange {
    /// `num_chapters` means chapters `1..=num_chapters` and wins over the
    /// explicit bounds.
    pub fn new(
        num_chapters: Option<ChapterId>,
        start: Option<ChapterId>,
        end: Option<ChapterId>,
    ) -> Self {
        match num_chapters {
            Some(n) => Self {
                start: Some(1),
                end: Some(n),
            },
            None => Self { start, end },
        }
    }

    pub fn contains(&self, id: ChapterId) -> bool {
        self.start.is_none_or(|start| id >= start) && self.end.is_none_or(|end| id <= end)
    }
}
