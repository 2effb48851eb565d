pub mod announce;
pub mod config;
pub mod db;
pub mod digest;
pub mod fetcher;
pub mod filter;
pub mod ingest;
pub mod mem;
pub mod models;
pub mod normalize;
pub mod publish;
pub mod store;
pub mod types;
pub mod webfinger;

pub use announce::{announce_group, announce_source, run_announcement_sweep, Announceable};
pub use config::Config;
pub use db::PgStore;
pub use digest::{send_weekly_digest, EmailSender};
pub use fetcher::{FeedFetcher, FetchFeed};
pub use ingest::{IngestionEngine, SourceKinds};
pub use mem::MemStore;
pub use publish::{drain_queue, HttpStatusApi, StatusApi};
pub use store::Store;
pub use types::{FetchConfig, GlamrError, RawEntry, Result};
