use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::error::{Result, SaverError};

/// Sites with a known chapter/image layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Webtoonscan,
    Manhwa18,
}

const SITES: &[(&str, Site)] = &[
    ("webtoonscan.com", Site::Webtoonscan),
    ("manhwa18.cc", Site::Manhwa18),
];

impl Site {
    /// Substring lookup against the static table. Exactly one entry must match.
    pub fn detect(url: &str) -> Result<Self> {
        let mut matches = SITES
            .iter()
            .filter(|(needle, _)| url.contains(needle))
            .map(|(_, site)| *site);

        match (matches.next(), matches.next()) {
            (Some(site), None) => Ok(site),
            (Some(_), Some(_)) => Err(SaverError::AmbiguousSite(url.to_owned())),
            (None, _) => Err(SaverError::UnsupportedSite(url.to_owned())),
        }
    }

    pub fn rule(self) -> SiteRule {
        match self {
            Site::Webtoonscan => SiteRule {
                site: self,
                chapter_item: selector("li.wp-manga-chapter"),
                image: ImageMatcher::Class("wp-manga-chapter-img"),
            },
            Site::Manhwa18 => SiteRule {
                site: self,
                chapter_item: selector("li.a-h.wleft"),
                image: ImageMatcher::ClassPattern(pattern(r"loading p\d+")),
            },
        }
    }

    /// manhwa18 serves relative chapter links, resolved against `<origin>/`.
    pub fn normalize_url(self, url: &str) -> String {
        match self {
            Site::Manhwa18 if !url.ends_with('/') => format!("{url}/"),
            _ => url.to_owned(),
        }
    }
}

// Table literals are fixed at compile time and covered by the tests below.
fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("bad built-in selector {css}: {e}"))
}

fn pattern(re: &'static str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| panic!("bad built-in pattern {re}: {e}"))
}

#[derive(Debug, Clone)]
pub enum ImageMatcher {
    /// A single class name, matched against any class of the element or
    /// against the whole class attribute.
    Class(&'static str),
    /// Searched in the whole class attribute.
    ClassPattern(Regex),
}

impl ImageMatcher {
    pub fn matches(&self, element: ElementRef) -> bool {
        let Some(class) = element.value().attr("class") else {
            return false;
        };
        match self {
            ImageMatcher::Class(name) => {
                class.trim() == *name || class.split_whitespace().any(|c| c == *name)
            }
            ImageMatcher::ClassPattern(re) => re.is_match(class),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteRule {
    pub site: Site,
    /// Chapter list entries; the chapter link is the first `a` inside.
    pub chapter_item: Selector,
    pub image: ImageMatcher,
}

impl SiteRule {
    pub fn resolve(url: &str) -> Result<Self> {
        Site::detect(url).map(Site::rule)
    }
}
