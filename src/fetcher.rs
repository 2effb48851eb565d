use crate::types::{FetchConfig, GlamrError, RawEntry, Result};
use async_trait::async_trait;
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Seam between the ingestion engine and the network; tests substitute a stub.
#[async_trait]
pub trait FetchFeed: Send + Sync {
    /// Retrieve and parse a feed into raw entries. Every network, timeout or
    /// parse failure comes back as `GlamrError::Fetch` carrying the URL.
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawEntry>>;
}

/// HTTP fetcher with the short/long timeout pair: 4s connect / 13s read on
/// the first attempt, one retry at 31s/31s when the first attempt times out.
/// A timeout on the retry means the site is unreasonably slow and the source
/// is reported as failing.
pub struct FeedFetcher {
    client: Client,
    retry_client: Client,
}

impl FeedFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        let retry_client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.retry_timeout_secs))
            .timeout(Duration::from_secs(config.retry_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            retry_client,
        })
    }

    async fn get_body(&self, url: &str) -> Result<String> {
        match Self::try_get(&self.client, url).await {
            Ok(body) => Ok(body),
            Err(e) if e.is_timeout() => {
                warn!("timeout fetching {url}, retrying with longer timeout");
                Self::try_get(&self.retry_client, url)
                    .await
                    .map_err(|e| fetch_error(url, &e))
            }
            Err(e) => Err(fetch_error(url, &e)),
        }
    }

    async fn try_get(client: &Client, url: &str) -> std::result::Result<String, reqwest::Error> {
        let response = client.get(url).send().await?;
        let response = response.error_for_status()?;
        response.text().await
    }

    fn parse(feed_url: &str, body: &str) -> Result<Vec<RawEntry>> {
        let feed = parser::parse(body.as_bytes()).map_err(|e| GlamrError::Fetch {
            url: feed_url.to_string(),
            reason: format!("malformed feed: {e}"),
        })?;

        let mut entries = Vec::new();
        for entry in feed.entries {
            // An entry with no link cannot be keyed or announced.
            let Some(link) = entry.links.first() else {
                debug!("skipping entry without link in {feed_url}");
                continue;
            };

            let guid = if entry.id.is_empty() {
                None
            } else {
                Some(entry.id.clone())
            };

            entries.push(RawEntry {
                guid,
                url: link.href.clone(),
                title: entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_else(|| "Untitled".to_string()),
                author: entry
                    .authors
                    .first()
                    .map(|a| a.name.clone())
                    .filter(|n| !n.is_empty()),
                summary: entry.summary.map(|s| s.content),
                content: entry.content.and_then(|c| c.body),
                categories: entry.categories.into_iter().map(|c| c.term).collect(),
                published: entry.published.map(|dt| dt.with_timezone(&Utc)),
                updated: entry.updated.map(|dt| dt.with_timezone(&Utc)),
            });
        }

        debug!("parsed {} entries from {feed_url}", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl FetchFeed for FeedFetcher {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawEntry>> {
        let body = self.get_body(feed_url).await?;
        Self::parse(feed_url, &body)
    }
}

fn fetch_error(url: &str, e: &reqwest::Error) -> GlamrError {
    GlamrError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    }
}
