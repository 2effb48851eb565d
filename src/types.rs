use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum GlamrError {
    #[error("fetch error for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("duplicate entry: {url}")]
    Conflict { url: String },

    #[error("status publish failed with HTTP {status}")]
    Publish { status: u16 },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, GlamrError>;

/// Timeout policy for outbound HTTP. The first attempt uses a short
/// connect/read pair; a timeout triggers exactly one retry with the long pair.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub retry_timeout_secs: u64,
}

impl FetchConfig {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            ..Self::default()
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "glamr-ingest/0.1".to_string(),
            connect_timeout_secs: 4,
            read_timeout_secs: 13,
            retry_timeout_secs: 31,
        }
    }
}

/// One entry as it came out of the feed, before normalization.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub guid: Option<String>,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub categories: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// A raw entry after the normalization rules have been applied, ready to
/// persist against its source.
#[derive(Debug, Clone)]
pub struct CanonicalEntry {
    pub title: String,
    pub author_name: String,
    pub url: String,
    pub guid: String,
    pub description: String,
    pub pubdate: DateTime<Utc>,
    pub updateddate: DateTime<Utc>,
    pub tags: Vec<String>,
}
