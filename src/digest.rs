use crate::announce::format_date;
use crate::models::SourceKind;
use crate::store::Store;
use crate::types::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use tracing::info;

const DIGEST_WINDOW_DAYS: i64 = 7;

/// Outbound email is someone else's problem; this is the whole interface.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()>;
}

/// Sender used when no mail transport is configured: logs the delivery and
/// moves on.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, subject: &str, _html_body: &str, recipient: &str) -> Result<()> {
        info!("would send '{}' to {}", subject, recipient);
        Ok(())
    }
}

/// Test double recording every delivery.
#[derive(Default)]
pub struct MockEmailSender {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()> {
        self.sent.lock().unwrap().push((
            subject.to_string(),
            html_body.to_string(),
            recipient.to_string(),
        ));
        Ok(())
    }
}

fn section(heading: &str, items: &str) -> String {
    if items.is_empty() {
        String::new()
    } else {
        format!("<h3 style='margin-top:20px;'>{heading}</h3>{items}<hr/>")
    }
}

fn listing(title_html: &str, byline: &str, description: &str) -> String {
    let byline_html = if byline.is_empty() {
        String::new()
    } else {
        format!("<p><em>{byline}</em></p>")
    };
    format!("{title_html}{byline_html}<p style='margin-bottom:24px;'>{description}</p>")
}

/// Assemble the week's additions into one HTML body. `None` when the week
/// had nothing worth sending.
pub async fn compose_weekly_digest(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let cutoff = now - Duration::days(DIGEST_WINDOW_DAYS);
    let today = now.date_naive();

    let mut new_blogs = String::new();
    let mut new_newsletters = String::new();
    for source in store.sources_added_since(cutoff).await? {
        let title = format!("<h4><a href='{}'>{}</a></h4>", source.url, source.title);
        let item = listing(
            &title,
            source.author_name.as_deref().unwrap_or(""),
            source.description.as_deref().unwrap_or(""),
        );
        match source.kind {
            SourceKind::Blog => new_blogs.push_str(&item),
            SourceKind::Newsletter => new_newsletters.push_str(&item),
        }
    }

    let mut new_entries = String::new();
    for entry in store.entries_published_since(cutoff).await? {
        let title = format!("<h4><a href='{}'>{}</a></h4>", entry.url, entry.title);
        new_entries.push_str(&listing(&title, &entry.author_name, &entry.description));
    }

    let mut coming_events = String::new();
    for event in store.events_added_since(cutoff).await? {
        let title = format!("<h4><a href='{}'>{}</a></h4>", event.url, event.name);
        coming_events.push_str(&listing(
            &title,
            &format_date(event.start_date),
            event.description.as_deref().unwrap_or(""),
        ));
    }

    let mut open_cfps = String::new();
    for cfp in store.open_cfps(today).await? {
        let Some(event) = store.event(cfp.event_id).await? else {
            continue;
        };
        let title = format!("<h4><a href='{}'>{}</a></h4>", event.url, cfp.name);
        let closes = format!("<strong>Closes:</strong> {}", format_date(cfp.closing_date));
        open_cfps.push_str(&listing(&title, &closes, cfp.details.as_deref().unwrap_or("")));
    }

    let mut new_groups = String::new();
    for group in store.groups_added_since(cutoff).await? {
        let title = format!(
            "<h4><a href='{}'>{}</a></h4>",
            group.registration_url, group.name
        );
        new_groups.push_str(&listing(
            &title,
            group.group_type.label(),
            group.description.as_deref().unwrap_or(""),
        ));
    }

    let sections = [
        section("New Blogs", &new_blogs),
        section("New Articles", &new_entries),
        section("Upcoming Events", &coming_events),
        section("Open Calls for Papers", &open_cfps),
        section("New Newsletters", &new_newsletters),
        section("New Groups", &new_groups),
    ]
    .concat();

    if sections.is_empty() {
        return Ok(None);
    }

    Ok(Some(format!("<html><body>{sections}</body></html>")))
}

/// Compose this week's digest and hand it to the sender for every confirmed
/// subscriber. A quiet week sends nothing.
pub async fn send_weekly_digest(
    store: &dyn Store,
    sender: &dyn EmailSender,
    now: DateTime<Utc>,
) -> Result<usize> {
    let Some(body) = compose_weekly_digest(store, now).await? else {
        info!("nothing new this week, skipping digest");
        return Ok(0);
    };

    let subscribers = store.confirmed_subscribers().await?;
    info!("sending weekly digest to {} subscribers", subscribers.len());

    let subject = format!("GLAMR community news, week of {}", format_date(now.date_naive()));
    let mut sent = 0;
    for subscriber in subscribers {
        sender.send(&subject, &body, &subscriber.email).await?;
        sent += 1;
    }
    Ok(sent)
}
