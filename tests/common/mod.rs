#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use glamr_ingest::models::{CallForPapers, Category, Event, Group, GroupType, Source, SourceKind};
use glamr_ingest::types::{GlamrError, RawEntry, Result};
use glamr_ingest::FetchFeed;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Serves canned entries per feed URL; URLs marked failing return a fetch
/// error, like an unreachable host would.
#[derive(Default)]
pub struct StubFeed {
    feeds: Mutex<HashMap<String, Vec<RawEntry>>>,
    failing: Mutex<Vec<String>>,
}

impl StubFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_entries(&self, feed_url: &str, entries: Vec<RawEntry>) {
        self.feeds
            .lock()
            .unwrap()
            .insert(feed_url.to_string(), entries);
    }

    pub fn set_failing(&self, feed_url: &str) {
        self.failing.lock().unwrap().push(feed_url.to_string());
    }
}

#[async_trait]
impl FetchFeed for StubFeed {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawEntry>> {
        if self.failing.lock().unwrap().iter().any(|u| u == feed_url) {
            return Err(GlamrError::Fetch {
                url: feed_url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self
            .feeds
            .lock()
            .unwrap()
            .get(feed_url)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn blog(title: &str, feed_url: &str) -> Source {
    Source {
        id: Uuid::new_v4(),
        kind: SourceKind::Blog,
        title: title.to_string(),
        author_name: Some("Alex".to_string()),
        url: format!("https://{}.example.com", title.to_lowercase().replace(' ', "-")),
        feed_url: feed_url.to_string(),
        description: Some("A blog about libraries".to_string()),
        category: Category::Libraries,
        activitypub_account: None,
        approved: true,
        announced: true,
        active: true,
        failing: false,
        suspended: false,
        suspension_lifted: None,
        added: Utc::now() - Duration::days(30),
        updateddate: Utc::now() - Duration::days(30),
    }
}

pub fn newsletter(title: &str, feed_url: &str) -> Source {
    Source {
        kind: SourceKind::Newsletter,
        ..blog(title, feed_url)
    }
}

pub fn raw_entry(title: &str, url: &str, published: DateTime<Utc>) -> RawEntry {
    RawEntry {
        guid: Some(format!("{url}#guid")),
        url: url.to_string(),
        title: title.to_string(),
        author: None,
        summary: Some(format!("A post about {title}")),
        content: None,
        categories: Vec::new(),
        published: Some(published),
        updated: Some(published),
    }
}

pub fn event(name: &str, start_date: NaiveDate, approved: bool) -> Event {
    Event {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: Category::Galleries,
        url: format!("https://{}.example.com", name.to_lowercase().replace(' ', "-")),
        description: Some("An annual gathering".to_string()),
        start_date,
        activitypub_account: None,
        approved,
        announcements: 0,
        added: Utc::now(),
    }
}

pub fn group(name: &str) -> Group {
    let url = format!("https://{}.example.com", name.to_lowercase().replace(' ', "-"));
    Group {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: Category::Glamr,
        group_type: GroupType::Slack,
        registration_url: format!("{url}/join"),
        url,
        description: Some("A place to chat".to_string()),
        approved: true,
        announced: false,
        added: Utc::now(),
    }
}

pub fn cfp(event_id: Uuid, opening: NaiveDate, closing: NaiveDate) -> CallForPapers {
    CallForPapers {
        id: Uuid::new_v4(),
        event_id,
        name: "Call for papers".to_string(),
        details: Some("Submit your talks".to_string()),
        opening_date: opening,
        closing_date: closing,
        approved: true,
        announcements: 0,
    }
}
