use crate::models::{
    Announcement, CallForPapers, ContentWarning, Entry, Event, Group, Source, SourceKind,
    Subscriber, Tag,
};
use crate::types::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Relational storage behind the pipeline. The Postgres adapter in `db` is
/// the production implementation; `mem::MemStore` backs the tests.
///
/// Uniqueness of (source feed URL, source site URL, entry URL, entry GUID)
/// is the adapter's responsibility: `insert_entry` must be a no-op returning
/// `false` when either entry key already exists, even under concurrent
/// passes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Approved, active, non-suspended sources of the given kind, or of both
    /// kinds when `kind` is `None`.
    async fn active_sources(&self, kind: Option<SourceKind>) -> Result<Vec<Source>>;

    async fn set_source_failing(&self, id: Uuid) -> Result<()>;

    /// Clear the failing flag and record the latest observed update time.
    async fn set_source_success(&self, id: Uuid, updateddate: DateTime<Utc>) -> Result<()>;

    /// Does an entry of this kind already exist with this canonical URL or
    /// this GUID?
    async fn entry_exists(&self, kind: SourceKind, url: &str, guid: &str) -> Result<bool>;

    /// Persist an entry with its tag links atomically. Returns `false` when a
    /// unique key already exists (a concurrent pass won the race).
    async fn insert_entry(&self, entry: &Entry) -> Result<bool>;

    /// Case-insensitive upsert by name; the name is stored lowercase.
    async fn upsert_tag(&self, name: &str) -> Result<Tag>;

    /// Approved sources whose welcome announcement has not gone out yet.
    async fn unannounced_sources(&self) -> Result<Vec<Source>>;

    async fn set_source_announced(&self, id: Uuid) -> Result<()>;

    /// Approved groups whose welcome announcement has not gone out yet.
    async fn unannounced_groups(&self) -> Result<Vec<Group>>;

    async fn set_group_announced(&self, id: Uuid) -> Result<()>;

    async fn enqueue_announcement(&self, status: &str, summary: Option<&str>) -> Result<()>;

    /// The head of the queue: the single oldest announcement by enqueue time.
    async fn oldest_announcement(&self) -> Result<Option<Announcement>>;

    async fn delete_announcement(&self, id: Uuid) -> Result<()>;

    /// Approved events that have not started yet and have not hit the
    /// announcement cap.
    async fn announceable_events(&self, today: NaiveDate) -> Result<Vec<Event>>;

    /// Approved calls for papers that have not closed yet and have not hit
    /// the announcement cap. Parent event approval is checked by the sweep.
    async fn announceable_cfps(&self, today: NaiveDate) -> Result<Vec<CallForPapers>>;

    async fn event(&self, id: Uuid) -> Result<Option<Event>>;

    /// Atomic increment of the event's announcement counter.
    async fn record_event_announcement(&self, id: Uuid) -> Result<()>;

    async fn record_cfp_announcement(&self, id: Uuid) -> Result<()>;

    async fn content_warnings(&self) -> Result<Vec<ContentWarning>>;

    // Weekly digest queries.

    async fn sources_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Source>>;

    async fn entries_published_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Entry>>;

    async fn events_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Event>>;

    async fn open_cfps(&self, today: NaiveDate) -> Result<Vec<CallForPapers>>;

    async fn groups_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Group>>;

    async fn confirmed_subscribers(&self) -> Result<Vec<Subscriber>>;
}
