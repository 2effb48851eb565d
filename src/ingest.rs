use crate::announce::announce_entry;
use crate::fetcher::FetchFeed;
use crate::filter::is_opted_out;
use crate::models::{Entry, Source, SourceKind};
use crate::normalize::normalize;
use crate::store::Store;
use crate::types::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Freshly ingested entries older than this are persisted silently, without
/// an announcement.
const ANNOUNCE_WINDOW_DAYS: i64 = 3;

/// Which sources a pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKinds {
    Blogs,
    Newsletters,
    Both,
}

impl SourceKinds {
    fn filter(self) -> Option<SourceKind> {
        match self {
            SourceKinds::Blogs => Some(SourceKind::Blog),
            SourceKinds::Newsletters => Some(SourceKind::Newsletter),
            SourceKinds::Both => None,
        }
    }
}

/// Outcome of one pass, for logging and tests.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub sources_checked: usize,
    pub sources_failed: usize,
    pub entries_ingested: usize,
}

/// Walks every active source, pipes the feed through normalization and the
/// opt-out filter, persists what is new and queues announcements for recent
/// posts. A failure on one source never aborts the pass.
pub struct IngestionEngine<'a> {
    store: &'a dyn Store,
    fetcher: &'a dyn FetchFeed,
}

impl<'a> IngestionEngine<'a> {
    pub fn new(store: &'a dyn Store, fetcher: &'a dyn FetchFeed) -> Self {
        Self { store, fetcher }
    }

    pub async fn run_pass(&self, kinds: SourceKinds, now: DateTime<Utc>) -> Result<PassSummary> {
        let sources = self.store.active_sources(kinds.filter()).await?;
        info!("checking {} feeds", sources.len());

        let mut summary = PassSummary::default();
        for source in sources {
            summary.sources_checked += 1;
            match self.ingest_source(&source, now).await {
                Ok(ingested) => {
                    summary.entries_ingested += ingested;
                }
                Err(e) => {
                    error!("error with {} {} - {}: {}", source.kind.as_str(), source.title, source.feed_url, e);
                    summary.sources_failed += 1;
                    if let Err(e) = self.store.set_source_failing(source.id).await {
                        error!("could not mark {} failing: {}", source.title, e);
                    }
                }
            }
        }

        info!(
            "pass complete: {} sources, {} failed, {} new entries",
            summary.sources_checked, summary.sources_failed, summary.entries_ingested
        );
        Ok(summary)
    }

    async fn ingest_source(&self, source: &Source, now: DateTime<Utc>) -> Result<usize> {
        let raw_entries = self.fetcher.fetch(&source.feed_url).await?;

        let mut ingested = 0;
        let mut latest_update: Option<DateTime<Utc>> = None;

        for raw in raw_entries {
            let dedup_guid = raw.guid.as_deref().unwrap_or(&raw.url);
            if self
                .store
                .entry_exists(source.kind, &raw.url, dedup_guid)
                .await?
            {
                continue;
            }

            // A lifted suspension leaves a window of already-seen posts
            // behind it; anything updated before the lift is assumed
            // ingested long ago.
            if let Some(lifted) = source.suspension_lifted {
                if let Some(updated) = raw.updated.or(raw.published) {
                    if updated < lifted {
                        debug!("skipping pre-suspension entry {}", raw.url);
                        continue;
                    }
                }
            }

            if is_opted_out(&raw.categories) {
                debug!("entry {} opted out", raw.url);
                continue;
            }

            let canonical = normalize(&raw, source, now);

            let tags = if source.kind == SourceKind::Blog {
                for tag in &canonical.tags {
                    self.store.upsert_tag(tag).await?;
                }
                canonical.tags.clone()
            } else {
                Vec::new()
            };

            let entry = Entry {
                id: Uuid::new_v4(),
                source_id: source.id,
                kind: source.kind,
                title: canonical.title,
                author_name: canonical.author_name,
                url: canonical.url,
                description: canonical.description,
                guid: canonical.guid,
                pubdate: canonical.pubdate,
                updateddate: canonical.updateddate,
                tags,
            };

            if !self.store.insert_entry(&entry).await? {
                // Another pass inserted it between our check and our write.
                debug!("lost insert race for {}", entry.url);
                continue;
            }

            latest_update = Some(match latest_update {
                Some(latest) => latest.max(entry.updateddate),
                None => entry.updateddate,
            });
            ingested += 1;

            if now - entry.pubdate <= Duration::days(ANNOUNCE_WINDOW_DAYS) {
                announce_entry(self.store, &entry, source).await?;
            }
        }

        self.store
            .set_source_success(source.id, latest_update.unwrap_or(source.updateddate))
            .await?;
        Ok(ingested)
    }
}
