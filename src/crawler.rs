pub mod fetcher;
pub mod images;
pub mod index;
pub mod parser;
pub mod task;

pub use fetcher::{Fetch, HttpFetcher};
pub use images::{DownloadReport, DownloadResult, fetch_images};
pub use index::{ChapterGap, ChapterId, ChapterIndex, ChapterRange};
pub use task::TaskManager;
