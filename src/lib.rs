pub mod config;
pub mod crawler;
pub mod document;
pub mod error;
pub mod fleet;
pub mod logger;
pub mod pipeline;
pub mod site;
pub mod utils;

pub use config::Settings;
pub use error::SaverError;
pub use fleet::{FleetSummary, RunOptions, run, run_with};
pub use site::{Site, SiteRule};
