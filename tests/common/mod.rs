#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::StatusCode;

use webtoonsaver::SaverError;
use webtoonsaver::crawler::{ChapterId, Fetch};

pub const INDEX_URL: &str = "https://webtoonscan.com/manhwa/demo/";

pub fn chapter_url(id: ChapterId) -> String {
    format!("https://webtoonscan.com/manhwa/demo/chapter-{id}/")
}

pub fn image_url(chapter: ChapterId, n: usize) -> String {
    format!("https://cdn.test/demo/c{chapter}/{n:02}.png")
}

/// Descending listing, as the site shows it.
pub fn index_html(ids: &[ChapterId]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="wp-manga-chapter"><a href="{}">Chapter {id}</a></li>"#,
                chapter_url(*id)
            )
        })
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

pub fn chapter_html(urls: &[String]) -> String {
    let imgs: String = urls
        .iter()
        .map(|u| format!(r#"<img class="wp-manga-chapter-img" src=" {u} ">"#))
        .collect();
    format!(r#"<html><body><div class="reading-content">{imgs}</div></body></html>"#)
}

pub fn png(width: u32, height: u32) -> Bytes {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 100, 50])))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

/// In-memory site. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockSite {
    pages: HashMap<String, String>,
    images: HashMap<String, Bytes>,
    panics: HashSet<String>,
    calls: AtomicUsize,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>, bytes: Bytes) -> Self {
        self.images.insert(url.into(), bytes);
        self
    }

    /// Chapter page listing `count` images, all of them served at `height`.
    pub fn chapter(mut self, id: ChapterId, count: usize, height: u32) -> Self {
        let urls: Vec<_> = (1..=count).map(|n| image_url(id, n)).collect();
        for url in &urls {
            self.images.insert(url.clone(), png(20, height));
        }
        self.pages.insert(chapter_url(id), chapter_html(&urls));
        self
    }

    /// Fetching `url` panics instead of answering.
    pub fn panic_on(mut self, url: impl Into<String>) -> Self {
        self.panics.insert(url.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

fn not_found(url: &str) -> SaverError {
    SaverError::Status {
        url: url.to_owned(),
        status: StatusCode::NOT_FOUND,
    }
}

#[async_trait]
impl Fetch for MockSite {
    async fn text(&self, url: &str) -> Result<String, SaverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panics.contains(url) {
            panic!("connection blew up on {url}");
        }
        self.pages.get(url).cloned().ok_or_else(|| not_found(url))
    }

    async fn bytes(&self, url: &str) -> Result<Bytes, SaverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.images.get(url).cloned().ok_or_else(|| not_found(url))
    }
}

/// Handle given to the fleet; every clone talks to the same site.
#[derive(Clone)]
pub struct MockFetcher(pub Arc<MockSite>);

#[async_trait]
impl Fetch for MockFetcher {
    async fn text(&self, url: &str) -> Result<String, SaverError> {
        self.0.text(url).await
    }

    async fn bytes(&self, url: &str) -> Result<Bytes, SaverError> {
        self.0.bytes(url).await
    }
}

pub fn pdf_page_count(path: &Path) -> usize {
    lopdf::Document::load(path).unwrap().get_pages().len()
}

pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
