mod common;

use std::sync::Arc;

use common::*;
use webtoonsaver::config::AssemblySettings;
use webtoonsaver::crawler::{ChapterGap, ChapterRange};
use webtoonsaver::{FleetSummary, RunOptions, run_with};

fn options(save_root: &std::path::Path) -> RunOptions {
    RunOptions {
        url: INDEX_URL.to_owned(),
        workers: Some(3),
        save_root: save_root.to_path_buf(),
        ..Default::default()
    }
}

fn fetcher(site: &Arc<MockSite>) -> impl Fn() -> anyhow::Result<MockFetcher> + Sync + use<> {
    let site = Arc::clone(site);
    move || Ok(MockFetcher(Arc::clone(&site)))
}

fn run(site: &Arc<MockSite>, options: &RunOptions) -> FleetSummary {
    run_with(options, &AssemblySettings::default(), fetcher(site)).unwrap()
}

#[test]
fn parallel_chapters_keep_to_their_own_paths() {
    let root = tempfile::tempdir().unwrap();
    // Chapter n has n + 1 pages, so any cross-writing shows up in page counts.
    let site = MockSite::new()
        .page(INDEX_URL, index_html(&[3, 2, 1]))
        .chapter(1, 2, 800)
        .chapter(2, 3, 800)
        .chapter(3, 4, 800)
        .shared();

    let summary = run(&site, &options(root.path()));

    assert_eq!(summary.saved, 3);
    assert!(summary.failed.is_empty());
    assert_eq!(
        entries(root.path()),
        ["Chapter-1.pdf", "Chapter-2.pdf", "Chapter-3.pdf"]
    );
    for id in 1..=3 {
        let path = root.path().join(format!("Chapter-{id}.pdf"));
        assert_eq!(pdf_page_count(&path), id + 1);
    }
}

#[test]
fn num_chapters_limits_the_run() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new()
        .page(INDEX_URL, index_html(&[4, 3, 2, 1]))
        .chapter(1, 1, 800)
        .chapter(2, 1, 800)
        .chapter(3, 1, 800)
        .chapter(4, 1, 800)
        .shared();

    let opts = RunOptions {
        num_chapters: Some(2),
        range: ChapterRange {
            start: Some(3),
            end: None,
        },
        ..options(root.path())
    };
    let summary = run(&site, &opts);

    assert_eq!(summary.saved, 2);
    assert_eq!(entries(root.path()), ["Chapter-1.pdf", "Chapter-2.pdf"]);
}

#[test]
fn explicit_range_is_inclusive() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new()
        .page(INDEX_URL, index_html(&[4, 3, 2, 1]))
        .chapter(1, 1, 800)
        .chapter(2, 1, 800)
        .chapter(3, 1, 800)
        .chapter(4, 1, 800)
        .shared();

    let opts = RunOptions {
        range: ChapterRange {
            start: Some(2),
            end: Some(3),
        },
        ..options(root.path())
    };
    run(&site, &opts);

    assert_eq!(entries(root.path()), ["Chapter-2.pdf", "Chapter-3.pdf"]);
}

#[test]
fn failing_chapter_does_not_stop_siblings() {
    let root = tempfile::tempdir().unwrap();
    // Chapter 2 is listed but its page is gone.
    let site = MockSite::new()
        .page(INDEX_URL, index_html(&[3, 2, 1]))
        .chapter(1, 1, 800)
        .chapter(3, 1, 800)
        .shared();

    let summary = run(&site, &options(root.path()));

    assert_eq!(summary.saved, 2);
    assert_eq!(summary.failed, [2]);
    assert_eq!(entries(root.path()), ["Chapter-1.pdf", "Chapter-3.pdf"]);
}

#[test]
fn panicking_chapter_is_recorded_and_cleaned_up() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new()
        .page(INDEX_URL, index_html(&[3, 2, 1]))
        .chapter(1, 1, 800)
        .chapter(2, 1, 800)
        .chapter(3, 1, 800)
        .panic_on(chapter_url(2))
        .shared();

    let summary = run(&site, &options(root.path()));

    assert_eq!(summary.saved, 2);
    assert_eq!(summary.failed, [2]);
    assert!(!root.path().join("Chapter2_Images").exists());
    assert_eq!(entries(root.path()), ["Chapter-1.pdf", "Chapter-3.pdf"]);
}

#[test]
fn gaps_are_reported_not_fatal() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new()
        .page(INDEX_URL, index_html(&[5, 4, 2]))
        .chapter(2, 1, 800)
        .chapter(4, 1, 800)
        .chapter(5, 1, 800)
        .shared();

    let summary = run(&site, &options(root.path()));

    assert_eq!(summary.saved, 3);
    assert_eq!(
        summary.gap,
        Some(ChapterGap {
            missing_count: 2,
            missing: vec![3],
        })
    );
}

#[test]
fn rerun_skips_saved_chapters() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new()
        .page(INDEX_URL, index_html(&[2, 1]))
        .chapter(1, 2, 800)
        .chapter(2, 2, 800)
        .shared();

    run(&site, &options(root.path()));
    let calls = site.calls();

    let summary = run(&site, &options(root.path()));

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.saved, 0);
    // Only the index page is fetched again.
    assert_eq!(site.calls(), calls + 1);
}

#[test]
fn empty_index_does_nothing() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new().page(INDEX_URL, index_html(&[])).shared();

    let summary = run(&site, &options(root.path()));

    assert_eq!(summary, Default::default());
    assert!(entries(root.path()).is_empty());
}
