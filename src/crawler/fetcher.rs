use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::config::HttpSettings;
use crate::error::{Result, SaverError};

/// Network access used by the crawler: page text and raw image bytes.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    async fn text(&self, url: &str) -> Result<String>;

    async fn bytes(&self, url: &str) -> Result<Bytes>;
}

/// One connection pool. The fleet builds one per chapter.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let user_agent = settings
            .user_agent
            .clone()
            .unwrap_or_else(|| ua_generator::ua::spoof_ua().to_owned());

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|source| SaverError::Fetch {
                url: "<client>".to_owned(),
                source,
            })?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SaverError::Fetch {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SaverError::Status {
                url: url.to_owned(),
                status,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn text(&self, url: &str) -> Result<String> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|source| SaverError::Fetch {
                url: url.to_owned(),
                source,
            })
    }

    async fn bytes(&self, url: &str) -> Result<Bytes> {
        self.get(url)
            .await?
            .bytes()
            .await
            .map_err(|source| SaverError::Fetch {
                url: url.to_owned(),
                source,
            })
    }
}
