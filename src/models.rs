use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The GLAMR sector vocabulary used in status templates and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Galleries,
    Libraries,
    Archives,
    Museums,
    Records,
    DigitalHumanities,
    Glamr,
}

impl Category {
    pub fn code(&self) -> &'static str {
        match self {
            Category::Galleries => "GAL",
            Category::Libraries => "LIB",
            Category::Archives => "ARC",
            Category::Museums => "MUS",
            Category::Records => "REC",
            Category::DigitalHumanities => "DH",
            Category::Glamr => "GLAM",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Galleries => "Galleries",
            Category::Libraries => "Libraries",
            Category::Archives => "Archives",
            Category::Museums => "Museums",
            Category::Records => "Records",
            Category::DigitalHumanities => "Digital Humanities",
            Category::Glamr => "GLAMR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "GAL" => Some(Category::Galleries),
            "LIB" => Some(Category::Libraries),
            "ARC" => Some(Category::Archives),
            "MUS" => Some(Category::Museums),
            "REC" => Some(Category::Records),
            "DH" => Some(Category::DigitalHumanities),
            "GLAM" => Some(Category::Glamr),
            _ => None,
        }
    }
}

/// Where a community group lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupType {
    Discord,
    Discourse,
    Email,
    Google,
    Kbin,
    Lemmy,
    Mastodon,
    Reddit,
    Slack,
    Zulip,
    Other,
}

impl GroupType {
    pub fn code(&self) -> &'static str {
        match self {
            GroupType::Discord => "DISC",
            GroupType::Discourse => "DCRS",
            GroupType::Email => "EML",
            GroupType::Google => "GOOG",
            GroupType::Kbin => "KBIN",
            GroupType::Lemmy => "LEMM",
            GroupType::Mastodon => "MAS",
            GroupType::Reddit => "RED",
            GroupType::Slack => "SLAC",
            GroupType::Zulip => "ZLIP",
            GroupType::Other => "OTHR",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupType::Discord => "Discord server",
            GroupType::Discourse => "Discourse community",
            GroupType::Email => "email list",
            GroupType::Google => "Google group",
            GroupType::Kbin => "KBin server",
            GroupType::Lemmy => "Lemmy server",
            GroupType::Mastodon => "Mastodon server",
            GroupType::Reddit => "subreddit",
            GroupType::Slack => "Slack channel",
            GroupType::Zulip => "Zulip server",
            GroupType::Other => "group",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "DISC" => Some(GroupType::Discord),
            "DCRS" => Some(GroupType::Discourse),
            "EML" => Some(GroupType::Email),
            "GOOG" => Some(GroupType::Google),
            "KBIN" => Some(GroupType::Kbin),
            "LEMM" => Some(GroupType::Lemmy),
            "MAS" => Some(GroupType::Mastodon),
            "RED" => Some(GroupType::Reddit),
            "SLAC" => Some(GroupType::Slack),
            "ZLIP" => Some(GroupType::Zulip),
            "OTHR" => Some(GroupType::Other),
            _ => None,
        }
    }
}

/// Blogs produce Articles, newsletters produce Editions. The kind decides
/// which status template applies and whether tags are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Blog,
    Newsletter,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Blog => "blog",
            SourceKind::Newsletter => "newsletter",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "blog" => Some(SourceKind::Blog),
            "newsletter" => Some(SourceKind::Newsletter),
            _ => None,
        }
    }
}

/// A registered feed. Feed URL and site URL are each globally unique; the
/// storage layer enforces both constraints.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: Uuid,
    pub kind: SourceKind,
    pub title: String,
    pub author_name: Option<String>,
    pub url: String,
    pub feed_url: String,
    pub description: Option<String>,
    pub category: Category,
    pub activitypub_account: Option<String>,
    pub approved: bool,
    pub announced: bool,
    pub active: bool,
    pub failing: bool,
    pub suspended: bool,
    pub suspension_lifted: Option<DateTime<Utc>>,
    pub added: DateTime<Utc>,
    pub updateddate: DateTime<Utc>,
}

impl Source {
    /// Eligible for an ingestion pass: approved by a moderator, not switched
    /// off by its owner, and not currently suspended.
    pub fn pollable(&self) -> bool {
        self.approved && self.active && !self.suspended
    }
}

/// One ingested post. Immutable after creation; owned by its source.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: Uuid,
    pub source_id: Uuid,
    pub kind: SourceKind,
    pub title: String,
    pub author_name: String,
    pub url: String,
    pub description: String,
    pub guid: String,
    pub pubdate: DateTime<Utc>,
    pub updateddate: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// A normalized lowercase label, unique by name.
#[derive(Debug, Clone)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub url: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub activitypub_account: Option<String>,
    pub approved: bool,
    pub announcements: i32,
    pub added: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CallForPapers {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub details: Option<String>,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub approved: bool,
    pub announcements: i32,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub group_type: GroupType,
    pub url: String,
    pub registration_url: String,
    pub description: Option<String>,
    pub approved: bool,
    pub announced: bool,
    pub added: DateTime<Utc>,
}

/// A queued outbound status message. `summary`, when present, is sent as the
/// content warning. Drained FIFO by `queued`.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub id: Uuid,
    pub status: String,
    pub summary: Option<String>,
    pub queued: DateTime<Utc>,
}

/// Maps a lowercase match substring to the display label used as a content
/// warning on entry announcements.
#[derive(Debug, Clone)]
pub struct ContentWarning {
    pub match_text: String,
    pub display: String,
}

impl ContentWarning {
    /// Return the warning label when the match text appears in `text`.
    pub fn check(&self, text: &str) -> Option<&str> {
        if text.to_lowercase().contains(&self.match_text) {
            Some(&self.display)
        } else {
            None
        }
    }
}

/// Someone who receives the weekly digest email.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub confirmed: bool,
}
