use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaverError {
    #[error("unsupported site: {0}")]
    UnsupportedSite(String),

    #[error("url matches more than one site rule: {0}")]
    AmbiguousSite(String),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no chapter identifier in {0}")]
    MissingChapterId(String),

    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

pub type Result<T> = std::result::Result<T, SaverError>;
