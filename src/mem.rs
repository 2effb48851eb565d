use crate::models::{
    Announcement, CallForPapers, ContentWarning, Entry, Event, Group, Source, SourceKind,
    Subscriber, Tag,
};
use crate::store::Store;
use crate::types::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory store with the same uniqueness semantics as the Postgres
/// adapter. Backs the integration tests and lets the binaries run against
/// fixtures without a database.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    sources: Vec<Source>,
    entries: Vec<Entry>,
    tags: Vec<Tag>,
    events: Vec<Event>,
    cfps: Vec<CallForPapers>,
    groups: Vec<Group>,
    announcements: Vec<Announcement>,
    warnings: Vec<ContentWarning>,
    subscribers: Vec<Subscriber>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&self, source: Source) {
        self.inner.lock().unwrap().sources.push(source);
    }

    pub fn add_event(&self, event: Event) {
        self.inner.lock().unwrap().events.push(event);
    }

    pub fn add_cfp(&self, cfp: CallForPapers) {
        self.inner.lock().unwrap().cfps.push(cfp);
    }

    pub fn add_group(&self, group: Group) {
        self.inner.lock().unwrap().groups.push(group);
    }

    pub fn add_content_warning(&self, warning: ContentWarning) {
        self.inner.lock().unwrap().warnings.push(warning);
    }

    pub fn add_subscriber(&self, subscriber: Subscriber) {
        self.inner.lock().unwrap().subscribers.push(subscriber);
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.inner.lock().unwrap().entries.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.inner.lock().unwrap().tags.clone()
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.inner.lock().unwrap().announcements.clone()
    }

    pub fn source(&self, id: Uuid) -> Option<Source> {
        self.inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn group(&self, id: Uuid) -> Option<Group> {
        self.inner
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
    }

    pub fn event_announcements(&self, id: Uuid) -> i32 {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.announcements)
            .unwrap_or(0)
    }

    pub fn cfp_announcements(&self, id: Uuid) -> i32 {
        self.inner
            .lock()
            .unwrap()
            .cfps
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.announcements)
            .unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemStore {
    async fn active_sources(&self, kind: Option<SourceKind>) -> Result<Vec<Source>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sources
            .iter()
            .filter(|s| s.pollable() && kind.map_or(true, |k| s.kind == k))
            .cloned()
            .collect())
    }

    async fn set_source_failing(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.failing = true;
        }
        Ok(())
    }

    async fn set_source_success(&self, id: Uuid, updateddate: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.failing = false;
            source.updateddate = updateddate;
        }
        Ok(())
    }

    async fn entry_exists(&self, kind: SourceKind, url: &str, guid: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .iter()
            .any(|e| e.kind == kind && (e.url == url || e.guid == guid)))
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner
            .entries
            .iter()
            .any(|e| e.kind == entry.kind && (e.url == entry.url || e.guid == entry.guid));
        if duplicate {
            return Ok(false);
        }
        inner.entries.push(entry.clone());
        Ok(true)
    }

    async fn upsert_tag(&self, name: &str) -> Result<Tag> {
        let name = name.to_lowercase();
        let mut inner = self.inner.lock().unwrap();
        if let Some(tag) = inner.tags.iter().find(|t| t.name == name) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name,
        };
        inner.tags.push(tag.clone());
        Ok(tag)
    }

    async fn unannounced_sources(&self) -> Result<Vec<Source>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sources
            .iter()
            .filter(|s| s.approved && !s.announced)
            .cloned()
            .collect())
    }

    async fn set_source_announced(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.announced = true;
        }
        Ok(())
    }

    async fn unannounced_groups(&self) -> Result<Vec<Group>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .groups
            .iter()
            .filter(|g| g.approved && !g.announced)
            .cloned()
            .collect())
    }

    async fn set_group_announced(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(group) = inner.groups.iter_mut().find(|g| g.id == id) {
            group.announced = true;
        }
        Ok(())
    }

    async fn enqueue_announcement(&self, status: &str, summary: Option<&str>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.announcements.push(Announcement {
            id: Uuid::new_v4(),
            status: status.to_string(),
            summary: summary.map(|s| s.to_string()),
            queued: Utc::now(),
        });
        Ok(())
    }

    async fn oldest_announcement(&self) -> Result<Option<Announcement>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .announcements
            .iter()
            .min_by_key(|a| a.queued)
            .cloned())
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.announcements.retain(|a| a.id != id);
        Ok(())
    }

    async fn announceable_events(&self, today: NaiveDate) -> Result<Vec<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .iter()
            .filter(|e| e.approved && e.announcements < 3 && e.start_date >= today)
            .cloned()
            .collect())
    }

    async fn announceable_cfps(&self, today: NaiveDate) -> Result<Vec<CallForPapers>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .cfps
            .iter()
            .filter(|c| c.approved && c.announcements < 3 && c.closing_date >= today)
            .cloned()
            .collect())
    }

    async fn event(&self, id: Uuid) -> Result<Option<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.events.iter().find(|e| e.id == id).cloned())
    }

    async fn record_event_announcement(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(event) = inner.events.iter_mut().find(|e| e.id == id) {
            event.announcements += 1;
        }
        Ok(())
    }

    async fn record_cfp_announcement(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(cfp) = inner.cfps.iter_mut().find(|c| c.id == id) {
            cfp.announcements += 1;
        }
        Ok(())
    }

    async fn content_warnings(&self) -> Result<Vec<ContentWarning>> {
        Ok(self.inner.lock().unwrap().warnings.clone())
    }

    async fn sources_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Source>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sources
            .iter()
            .filter(|s| s.approved && s.added >= cutoff)
            .cloned()
            .collect())
    }

    async fn entries_published_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Entry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.pubdate >= cutoff)
            .cloned()
            .collect())
    }

    async fn events_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .iter()
            .filter(|e| e.approved && e.added >= cutoff)
            .cloned()
            .collect())
    }

    async fn open_cfps(&self, today: NaiveDate) -> Result<Vec<CallForPapers>> {
        let inner = self.inner.lock().unwrap();
        let approved_events: Vec<Uuid> = inner
            .events
            .iter()
            .filter(|e| e.approved)
            .map(|e| e.id)
            .collect();
        Ok(inner
            .cfps
            .iter()
            .filter(|c| {
                c.approved && c.closing_date >= today && approved_events.contains(&c.event_id)
            })
            .cloned()
            .collect())
    }

    async fn groups_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Group>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .groups
            .iter()
            .filter(|g| g.approved && g.added >= cutoff)
            .cloned()
            .collect())
    }

    async fn confirmed_subscribers(&self) -> Result<Vec<Subscriber>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .subscribers
            .iter()
            .filter(|s| s.confirmed)
            .cloned()
            .collect())
    }
}
