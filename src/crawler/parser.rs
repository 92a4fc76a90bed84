use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::site::SiteRule;

static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector"));
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("img selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLink {
    /// `href` as written in the page; the chapter number is read from it.
    pub href: String,
    /// `href` resolved against the index page.
    pub url: String,
}

#[instrument(skip_all)]
pub fn chapter_links(index_html: &str, rule: &SiteRule, base: &Url) -> Vec<ChapterLink> {
    let document = Html::parse_document(index_html);
    let mut links = Vec::new();

    for item in document.select(&rule.chapter_item) {
        let Some(href) = item
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            debug!("chapter entry without link");
            continue;
        };
        let href = href.trim();
        match base.join(href) {
            Ok(url) => links.push(ChapterLink {
                href: href.to_owned(),
                url: url.into(),
            }),
            Err(e) => warn!(href, "unusable chapter link: {}", e),
        }
    }
    links
}

/// Image sources of a chapter page, in document order, with embedded
/// whitespace removed.
#[instrument(skip_all)]
pub fn image_urls(chapter_html: &str, rule: &SiteRule, base: &Url) -> Vec<String> {
    let document = Html::parse_document(chapter_html);
    let mut srcs = Vec::new();

    for img in document.select(&IMG).filter(|e| rule.image.matches(*e)) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        let src: String = src.split_whitespace().collect();
        if src.is_empty() {
            continue;
        }
        match base.join(&src) {
            Ok(url) => srcs.push(url.into()),
            Err(e) => warn!(src = %src, "unusable image source: {}", e),
        }
    }
    srcs
}
