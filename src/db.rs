use crate::models::{
    Announcement, CallForPapers, Category, ContentWarning, Entry, Event, Group, GroupType, Source,
    SourceKind, Subscriber, Tag,
};
use crate::store::Store;
use crate::types::{GlamrError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

/// Postgres-backed store. Unique indexes on sources(feed_url), sources(url),
/// entries(kind, url) and entries(kind, guid) give the idempotence guarantees
/// the ingestion engine relies on; see `migrations/`.
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!().run(&pool).await?;
        info!("connected to database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

fn source_from_row(row: &PgRow) -> Result<Source> {
    let kind: String = row.try_get("kind")?;
    let category: String = row.try_get("category")?;
    Ok(Source {
        id: row.try_get("id")?,
        kind: SourceKind::from_str(&kind)
            .ok_or_else(|| GlamrError::General(format!("unknown source kind: {kind}")))?,
        title: row.try_get("title")?,
        author_name: row.try_get("author_name")?,
        url: row.try_get("url")?,
        feed_url: row.try_get("feed_url")?,
        description: row.try_get("description")?,
        category: Category::from_code(&category)
            .ok_or_else(|| GlamrError::General(format!("unknown category: {category}")))?,
        activitypub_account: row.try_get("activitypub_account")?,
        approved: row.try_get("approved")?,
        announced: row.try_get("announced")?,
        active: row.try_get("active")?,
        failing: row.try_get("failing")?,
        suspended: row.try_get("suspended")?,
        suspension_lifted: row.try_get("suspension_lifted")?,
        added: row.try_get("added")?,
        updateddate: row.try_get("updateddate")?,
    })
}

fn entry_from_row(row: &PgRow) -> Result<Entry> {
    let kind: String = row.try_get("kind")?;
    Ok(Entry {
        id: row.try_get("id")?,
        source_id: row.try_get("source_id")?,
        kind: SourceKind::from_str(&kind)
            .ok_or_else(|| GlamrError::General(format!("unknown entry kind: {kind}")))?,
        title: row.try_get("title")?,
        author_name: row.try_get("author_name")?,
        url: row.try_get("url")?,
        description: row.try_get("description")?,
        guid: row.try_get("guid")?,
        pubdate: row.try_get("pubdate")?,
        updateddate: row.try_get("updateddate")?,
        tags: Vec::new(),
    })
}

fn event_from_row(row: &PgRow) -> Result<Event> {
    let category: String = row.try_get("category")?;
    Ok(Event {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: Category::from_code(&category)
            .ok_or_else(|| GlamrError::General(format!("unknown category: {category}")))?,
        url: row.try_get("url")?,
        description: row.try_get("description")?,
        start_date: row.try_get("start_date")?,
        activitypub_account: row.try_get("activitypub_account")?,
        approved: row.try_get("approved")?,
        announcements: row.try_get("announcements")?,
        added: row.try_get("added")?,
    })
}

fn cfp_from_row(row: &PgRow) -> Result<CallForPapers> {
    Ok(CallForPapers {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        name: row.try_get("name")?,
        details: row.try_get("details")?,
        opening_date: row.try_get("opening_date")?,
        closing_date: row.try_get("closing_date")?,
        approved: row.try_get("approved")?,
        announcements: row.try_get("announcements")?,
    })
}

fn group_from_row(row: &PgRow) -> Result<Group> {
    let category: String = row.try_get("category")?;
    let group_type: String = row.try_get("group_type")?;
    Ok(Group {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: Category::from_code(&category)
            .ok_or_else(|| GlamrError::General(format!("unknown category: {category}")))?,
        group_type: GroupType::from_code(&group_type)
            .ok_or_else(|| GlamrError::General(format!("unknown group type: {group_type}")))?,
        url: row.try_get("url")?,
        registration_url: row.try_get("registration_url")?,
        description: row.try_get("description")?,
        approved: row.try_get("approved")?,
        announced: row.try_get("announced")?,
        added: row.try_get("added")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn active_sources(&self, kind: Option<SourceKind>) -> Result<Vec<Source>> {
        let rows = match kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT * FROM sources \
                     WHERE approved AND active AND NOT suspended AND kind = $1 \
                     ORDER BY added",
                )
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT * FROM sources \
                     WHERE approved AND active AND NOT suspended \
                     ORDER BY added",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(source_from_row).collect()
    }

    async fn set_source_failing(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sources SET failing = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_source_success(&self, id: Uuid, updateddate: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE sources SET failing = false, updateddate = $1 WHERE id = $2")
            .bind(updateddate)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn entry_exists(&self, kind: SourceKind, url: &str, guid: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entries WHERE kind = $1 AND (url = $2 OR guid = $3)",
        )
        .bind(kind.as_str())
        .bind(url)
        .bind(guid)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO entries \
             (id, source_id, kind, title, author_name, url, description, guid, pubdate, updateddate) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT DO NOTHING",
        )
        .bind(entry.id)
        .bind(entry.source_id)
        .bind(entry.kind.as_str())
        .bind(&entry.title)
        .bind(&entry.author_name)
        .bind(&entry.url)
        .bind(&entry.description)
        .bind(&entry.guid)
        .bind(entry.pubdate)
        .bind(entry.updateddate)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // A concurrent pass already wrote this entry.
            tx.rollback().await?;
            return Ok(false);
        }

        for tag in &entry.tags {
            sqlx::query(
                "INSERT INTO entry_tags (entry_id, tag_id) \
                 SELECT $1, id FROM tags WHERE name = $2 \
                 ON CONFLICT DO NOTHING",
            )
            .bind(entry.id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn upsert_tag(&self, name: &str) -> Result<Tag> {
        let name = name.to_lowercase();
        let row = sqlx::query(
            "INSERT INTO tags (id, name) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .fetch_one(&self.pool)
        .await?;
        Ok(Tag {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }

    async fn unannounced_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query(
            "SELECT * FROM sources WHERE approved AND NOT announced ORDER BY added",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(source_from_row).collect()
    }

    async fn set_source_announced(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sources SET announced = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unannounced_groups(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            "SELECT * FROM groups WHERE approved AND NOT announced ORDER BY added",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(group_from_row).collect()
    }

    async fn set_group_announced(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE groups SET announced = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn enqueue_announcement(&self, status: &str, summary: Option<&str>) -> Result<()> {
        sqlx::query(
            "INSERT INTO announcements (id, status, summary, queued) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(status)
        .bind(summary)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn oldest_announcement(&self) -> Result<Option<Announcement>> {
        let row = sqlx::query("SELECT * FROM announcements ORDER BY queued LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(Announcement {
                id: row.try_get("id")?,
                status: row.try_get("status")?,
                summary: row.try_get("summary")?,
                queued: row.try_get("queued")?,
            })),
            None => Ok(None),
        }
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn announceable_events(&self, today: NaiveDate) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT * FROM events \
             WHERE approved AND announcements < 3 AND start_date >= $1 \
             ORDER BY start_date",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn announceable_cfps(&self, today: NaiveDate) -> Result<Vec<CallForPapers>> {
        let rows = sqlx::query(
            "SELECT * FROM calls_for_papers \
             WHERE approved AND announcements < 3 AND closing_date >= $1 \
             ORDER BY closing_date",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(cfp_from_row).collect()
    }

    async fn event(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn record_event_announcement(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE events SET announcements = announcements + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_cfp_announcement(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE calls_for_papers SET announcements = announcements + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn content_warnings(&self) -> Result<Vec<ContentWarning>> {
        let rows = sqlx::query("SELECT match_text, display FROM content_warnings")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(ContentWarning {
                    match_text: row.try_get("match_text")?,
                    display: row.try_get("display")?,
                })
            })
            .collect()
    }

    async fn sources_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Source>> {
        let rows = sqlx::query(
            "SELECT * FROM sources WHERE approved AND added >= $1 ORDER BY added",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(source_from_row).collect()
    }

    async fn entries_published_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Entry>> {
        let rows = sqlx::query("SELECT * FROM entries WHERE pubdate >= $1 ORDER BY pubdate")
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn events_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT * FROM events WHERE approved AND added >= $1 ORDER BY start_date",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn open_cfps(&self, today: NaiveDate) -> Result<Vec<CallForPapers>> {
        let rows = sqlx::query(
            "SELECT c.* FROM calls_for_papers c \
             JOIN events e ON e.id = c.event_id \
             WHERE c.approved AND e.approved AND c.closing_date >= $1 \
             ORDER BY c.closing_date",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(cfp_from_row).collect()
    }

    async fn groups_added_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            "SELECT * FROM groups WHERE approved AND added >= $1 ORDER BY added",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(group_from_row).collect()
    }

    async fn confirmed_subscribers(&self) -> Result<Vec<Subscriber>> {
        let rows = sqlx::query("SELECT id, email, confirmed FROM subscribers WHERE confirmed")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Subscriber {
                    id: row.try_get("id")?,
                    email: row.try_get("email")?,
                    confirmed: row.try_get("confirmed")?,
                })
            })
            .collect()
    }
}
