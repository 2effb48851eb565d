use crate::config::StatusApiConfig;
use crate::store::Store;
use crate::types::{GlamrError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

/// The external status-publishing endpoint (a Mastodon-compatible API).
#[async_trait]
pub trait StatusApi: Send + Sync {
    async fn post_status(&self, status: &str, spoiler_text: Option<&str>) -> Result<()>;
}

pub struct HttpStatusApi {
    client: Client,
    base_url: String,
    access_token: String,
}

impl HttpStatusApi {
    pub fn new(config: &StatusApiConfig, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(13))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl StatusApi for HttpStatusApi {
    async fn post_status(&self, status: &str, spoiler_text: Option<&str>) -> Result<()> {
        let url = format!("{}/api/v1/statuses", self.base_url);

        let mut form = vec![("status", status)];
        if let Some(summary) = spoiler_text {
            form.push(("spoiler_text", summary));
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GlamrError::Publish {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Test double that records every posted status and can be flipped into a
/// failing state.
#[derive(Default)]
pub struct MockStatusApi {
    pub posted: Mutex<Vec<(String, Option<String>)>>,
    pub failing: Mutex<bool>,
}

impl MockStatusApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn posts(&self) -> Vec<(String, Option<String>)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusApi for MockStatusApi {
    async fn post_status(&self, status: &str, spoiler_text: Option<&str>) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(GlamrError::Publish { status: 401 });
        }
        self.posted
            .lock()
            .unwrap()
            .push((status.to_string(), spoiler_text.map(|s| s.to_string())));
        Ok(())
    }
}

/// Deliver the single oldest queued announcement. Deleted only on a confirmed
/// 2xx; on any other outcome the row stays queued and the next scheduled
/// drain retries it.
pub async fn drain_queue(store: &dyn Store, api: &dyn StatusApi) -> Result<()> {
    let Some(announcement) = store.oldest_announcement().await? else {
        return Ok(());
    };

    match api
        .post_status(&announcement.status, announcement.summary.as_deref())
        .await
    {
        Ok(()) => {
            store.delete_announcement(announcement.id).await?;
            info!("published announcement queued at {}", announcement.queued);
        }
        Err(e) => {
            warn!(
                "publish failed for announcement queued at {}, leaving it queued: {}",
                announcement.queued, e
            );
        }
    }
    Ok(())
}
