use crate::models::{CallForPapers, ContentWarning, Entry, Event, Group, Source, SourceKind};
use crate::store::Store;
use crate::types::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{debug, info};

const ANNOUNCEMENT_CAP: i32 = 3;
const FINAL_REMINDER_DAYS: i64 = 7;
const EARLY_REMINDER_DAYS: i64 = 90;

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%a %d %b %Y").to_string()
}

/// Anything that can be turned into a status message. The scheduler and the
/// announce operations depend only on this; each entity keeps its own
/// template.
pub trait Announceable {
    fn build_status_text(&self) -> String;
}

impl Announceable for Source {
    fn build_status_text(&self) -> String {
        let category = self.category.label();
        match self.kind {
            SourceKind::Blog => {
                let author = self
                    .activitypub_account
                    .as_deref()
                    .or(self.author_name.as_deref())
                    .map(|a| format!(" by {a}"))
                    .unwrap_or_default();
                format!(
                    "{}{} has been added to Aus GLAMR!\n\nIt's about {}\n\n{}",
                    self.title, author, category, self.url
                )
            }
            SourceKind::Newsletter => {
                let name = match &self.activitypub_account {
                    Some(account) => format!("{} ({})", self.title, account),
                    None => self.title.clone(),
                };
                let author = self.author_name.as_deref().unwrap_or("the community");
                format!(
                    "{} is a newsletter about {} from {}. Check it out:\n\n{}",
                    name, category, author, self.url
                )
            }
        }
    }
}

impl Announceable for Event {
    fn build_status_text(&self) -> String {
        let name = match &self.activitypub_account {
            Some(account) => format!("{} ({})", self.name, account),
            None => self.name.clone(),
        };
        format!(
            "{} is an event about {}, starting on {}!\n\n{}",
            name,
            self.category.label(),
            format_date(self.start_date),
            self.url
        )
    }
}

impl Announceable for Group {
    fn build_status_text(&self) -> String {
        format!(
            "{} is a {} about {}!\n\nJoin them: {}",
            self.name,
            self.group_type.label(),
            self.category.label(),
            self.registration_url
        )
    }
}

/// An entry paired with its source, which supplies the attributed actor and
/// the source title for the template.
pub struct EntryAnnouncement<'a> {
    pub entry: &'a Entry,
    pub source: &'a Source,
}

impl Announceable for EntryAnnouncement<'_> {
    fn build_status_text(&self) -> String {
        let author = self
            .source
            .activitypub_account
            .as_deref()
            .or_else(|| {
                if self.entry.author_name.is_empty() {
                    None
                } else {
                    Some(self.entry.author_name.as_str())
                }
            })
            .map(|a| format!("{a} "))
            .unwrap_or_default();

        match self.entry.kind {
            SourceKind::Blog => format!(
                "{} ({}on {})\n\n{}",
                self.entry.title, author, self.source.title, self.entry.url
            ),
            SourceKind::Newsletter => format!(
                "{} is the latest edition of {}\n\n{}",
                self.entry.title, self.source.title, self.entry.url
            ),
        }
    }
}

/// A call for papers paired with its parent event, which supplies the event
/// name and URL for the template.
pub struct CfpAnnouncement<'a> {
    pub cfp: &'a CallForPapers,
    pub event: &'a Event,
}

impl Announceable for CfpAnnouncement<'_> {
    fn build_status_text(&self) -> String {
        format!(
            "{} {} is open from {}, closing on {}!\n\nMore info at {}",
            self.event.name,
            self.cfp.name,
            format_date(self.cfp.opening_date),
            format_date(self.cfp.closing_date),
            self.event.url
        )
    }
}

/// Collect content warning labels matching the entry's title, description or
/// tag names. The joined labels become the announcement's spoiler text.
pub fn warning_summary(warnings: &[ContentWarning], entry: &Entry) -> Option<String> {
    let mut labels: Vec<&str> = Vec::new();
    for warning in warnings {
        let hit = warning
            .check(&entry.title)
            .or_else(|| warning.check(&entry.description))
            .or_else(|| entry.tags.iter().find_map(|tag| warning.check(tag)));
        if let Some(label) = hit {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    if labels.is_empty() {
        None
    } else {
        Some(labels.join(", "))
    }
}

/// One-shot announcement for a freshly ingested entry.
pub async fn announce_entry(store: &dyn Store, entry: &Entry, source: &Source) -> Result<()> {
    let warnings = store.content_warnings().await?;
    let summary = warning_summary(&warnings, entry);
    let status = EntryAnnouncement { entry, source }.build_status_text();
    store
        .enqueue_announcement(&status, summary.as_deref())
        .await?;
    info!("queued announcement for {}", entry.url);
    Ok(())
}

/// Welcome announcement for a newly approved source. The announced flag is
/// set in the same call so the welcome fires exactly once.
pub async fn announce_source(store: &dyn Store, source: &Source) -> Result<()> {
    store
        .enqueue_announcement(&source.build_status_text(), None)
        .await?;
    store.set_source_announced(source.id).await?;
    info!("queued welcome announcement for {}", source.title);
    Ok(())
}

/// Welcome announcement for a newly approved group, fired exactly once.
pub async fn announce_group(store: &dyn Store, group: &Group) -> Result<()> {
    store
        .enqueue_announcement(&group.build_status_text(), None)
        .await?;
    store.set_group_announced(group.id).await?;
    info!("queued welcome announcement for {}", group.name);
    Ok(())
}

/// Should this event fire a reminder now? A fresh event always fires; after
/// that, reminders fire as the start date approaches, never more than three
/// in total.
pub fn event_due(event: &Event, today: NaiveDate) -> bool {
    if event.announcements >= ANNOUNCEMENT_CAP {
        return false;
    }
    let days_until_start = (event.start_date - today).num_days();
    event.announcements < 1
        || days_until_start < FINAL_REMINDER_DAYS
        || (days_until_start < EARLY_REMINDER_DAYS && event.announcements < 2)
}

/// Decaying-repeat policy for a call for papers: a fresh CFP fires, the
/// second reminder fires once the window is more than half elapsed, and the
/// last fires inside the final week before closing.
pub fn cfp_due(cfp: &CallForPapers, today: NaiveDate) -> bool {
    if cfp.announcements >= ANNOUNCEMENT_CAP {
        return false;
    }
    let since_opening = (today - cfp.opening_date).num_days();
    let until_closing = (cfp.closing_date - today).num_days();
    cfp.announcements < 1
        || (since_opening > until_closing && cfp.announcements < 2)
        || until_closing < FINAL_REMINDER_DAYS
}

/// Periodic sweep: queue welcome announcements for newly approved sources
/// and groups, then reminder announcements for live events and calls for
/// papers that are due, bumping the persisted counters.
pub async fn run_announcement_sweep(store: &dyn Store, now: DateTime<Utc>) -> Result<()> {
    let today = now.date_naive();
    let mut queued = 0usize;

    for source in store.unannounced_sources().await? {
        announce_source(store, &source).await?;
        queued += 1;
    }

    for group in store.unannounced_groups().await? {
        announce_group(store, &group).await?;
        queued += 1;
    }

    for event in store.announceable_events(today).await? {
        if event_due(&event, today) {
            store
                .enqueue_announcement(&event.build_status_text(), None)
                .await?;
            store.record_event_announcement(event.id).await?;
            queued += 1;
            debug!(
                "queued reminder {} for event {}",
                event.announcements + 1,
                event.name
            );
        }
    }

    for cfp in store.announceable_cfps(today).await? {
        let Some(event) = store.event(cfp.event_id).await? else {
            continue;
        };
        if !event.approved {
            // Never announce a CFP ahead of its event.
            continue;
        }
        if cfp_due(&cfp, today) {
            let status = CfpAnnouncement {
                cfp: &cfp,
                event: &event,
            }
            .build_status_text();
            store.enqueue_announcement(&status, None).await?;
            store.record_cfp_announcement(cfp.id).await?;
            queued += 1;
            debug!(
                "queued reminder {} for CFP {} ({})",
                cfp.announcements + 1,
                cfp.name,
                event.name
            );
        }
    }

    info!(
        "announcement sweep queued {} reminders for week {}",
        queued,
        today.iso_week().week()
    );
    Ok(())
}
