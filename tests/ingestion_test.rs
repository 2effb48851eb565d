mod common;

use chrono::{Duration, Utc};
use common::{blog, newsletter, raw_entry, StubFeed};
use glamr_ingest::{IngestionEngine, MemStore, SourceKinds};

fn engine<'a>(store: &'a MemStore, feed: &'a StubFeed) -> IngestionEngine<'a> {
    IngestionEngine::new(store, feed)
}

#[tokio::test]
async fn fresh_post_is_persisted_tagged_and_announced() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let source = blog("My Blog", "https://myblog.example.com/feed");
    store.add_source(source.clone());

    let mut entry = raw_entry(
        "My amazing blog post",
        "https://myblog.example.com/amazing",
        now,
    );
    entry.categories = vec!["testing".to_string(), "python".to_string()];
    feed.set_entries(&source.feed_url, vec![entry]);

    let summary = engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    assert_eq!(summary.entries_ingested, 1);
    assert_eq!(store.entries().len(), 1);
    assert_eq!(store.tags().len(), 2);

    let announcements = store.announcements();
    assert_eq!(announcements.len(), 1);
    assert!(announcements[0].status.contains("My amazing blog post"));
    assert!(announcements[0]
        .status
        .contains("https://myblog.example.com/amazing"));

    // An identical second pass must change nothing: the dedup check
    // short-circuits before persistence and announcement.
    engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, Utc::now())
        .await
        .unwrap();

    assert_eq!(store.entries().len(), 1);
    assert_eq!(store.tags().len(), 2);
    assert_eq!(store.announcements().len(), 1);
}

#[tokio::test]
async fn entry_without_id_is_keyed_by_link() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let source = blog("Linky", "https://linky.example.com/feed");
    store.add_source(source.clone());

    let mut entry = raw_entry("No guid here", "https://linky.example.com/post", now);
    entry.guid = None;
    feed.set_entries(&source.feed_url, vec![entry]);

    engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();
    engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].guid, "https://linky.example.com/post");
}

#[tokio::test]
async fn opt_out_tag_blocks_persistence_entirely() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let source = blog("Mixed", "https://mixed.example.com/feed");
    store.add_source(source.clone());

    let mut opted_out = raw_entry("Private thoughts", "https://mixed.example.com/private", now);
    opted_out.categories = vec!["Libraries".to_string(), "NotGLAM".to_string()];
    let kept = raw_entry("Public thoughts", "https://mixed.example.com/public", now);
    feed.set_entries(&source.feed_url, vec![opted_out, kept]);

    engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Public thoughts");
    // The legitimate co-tag must not leave a tag row behind either.
    assert!(store.tags().is_empty());
    assert_eq!(store.announcements().len(), 1);
}

#[tokio::test]
async fn suspension_window_drops_older_entries() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();
    let lifted = now - Duration::days(10);

    let mut source = blog("Suspended Once", "https://suspended.example.com/feed");
    source.suspension_lifted = Some(lifted);
    store.add_source(source.clone());

    let before = raw_entry(
        "Posted during suspension",
        "https://suspended.example.com/old",
        lifted - Duration::days(2),
    );
    let after = raw_entry(
        "Posted after reinstatement",
        "https://suspended.example.com/new",
        lifted + Duration::days(2),
    );
    feed.set_entries(&source.feed_url, vec![before, after]);

    engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Posted after reinstatement");
}

#[tokio::test]
async fn old_post_is_persisted_but_not_announced() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let source = blog("Archives", "https://archives.example.com/feed");
    store.add_source(source.clone());

    let stale = raw_entry(
        "From the vault",
        "https://archives.example.com/vault",
        now - Duration::days(10),
    );
    let fresh = raw_entry("Hot take", "https://archives.example.com/hot", now);
    feed.set_entries(&source.feed_url, vec![stale, fresh]);

    engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    assert_eq!(store.entries().len(), 2);
    let announcements = store.announcements();
    assert_eq!(announcements.len(), 1);
    assert!(announcements[0].status.contains("Hot take"));
}

#[tokio::test]
async fn failing_source_is_flagged_and_pass_continues() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let broken = blog("Broken", "https://broken.example.com/feed");
    let healthy = blog("Healthy", "https://healthy.example.com/feed");
    store.add_source(broken.clone());
    store.add_source(healthy.clone());

    feed.set_failing(&broken.feed_url);
    feed.set_entries(
        &healthy.feed_url,
        vec![raw_entry("Still here", "https://healthy.example.com/post", now)],
    );

    let summary = engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    assert_eq!(summary.sources_checked, 2);
    assert_eq!(summary.sources_failed, 1);
    assert_eq!(summary.entries_ingested, 1);
    assert!(store.source(broken.id).unwrap().failing);
    assert!(!store.source(healthy.id).unwrap().failing);
}

#[tokio::test]
async fn success_clears_failing_and_records_latest_update() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let mut source = blog("Recovering", "https://recovering.example.com/feed");
    source.failing = true;
    store.add_source(source.clone());

    let newest = now - Duration::hours(1);
    feed.set_entries(
        &source.feed_url,
        vec![
            raw_entry("Older", "https://recovering.example.com/a", now - Duration::days(2)),
            raw_entry("Newest", "https://recovering.example.com/b", newest),
        ],
    );

    engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    let refreshed = store.source(source.id).unwrap();
    assert!(!refreshed.failing);
    assert_eq!(refreshed.updateddate, newest);
}

#[tokio::test]
async fn newsletter_editions_carry_no_tags() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let source = newsletter("GLAM Weekly", "https://glamweekly.example.com/feed");
    store.add_source(source.clone());

    let mut edition = raw_entry("Issue 42", "https://glamweekly.example.com/42", now);
    edition.categories = vec!["libraries".to_string()];
    feed.set_entries(&source.feed_url, vec![edition]);

    engine(&store, &feed)
        .run_pass(SourceKinds::Newsletters, now)
        .await
        .unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].tags.is_empty());
    assert!(store.tags().is_empty());
}

#[tokio::test]
async fn pass_kind_filter_ignores_other_sources() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let b = blog("Only Blogs", "https://onlyblogs.example.com/feed");
    let n = newsletter("Not Polled", "https://notpolled.example.com/feed");
    store.add_source(b.clone());
    store.add_source(n.clone());

    feed.set_entries(
        &b.feed_url,
        vec![raw_entry("A post", "https://onlyblogs.example.com/post", now)],
    );
    feed.set_entries(
        &n.feed_url,
        vec![raw_entry("An edition", "https://notpolled.example.com/1", now)],
    );

    let summary = engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    assert_eq!(summary.sources_checked, 1);
    assert_eq!(store.entries().len(), 1);
    assert_eq!(store.entries()[0].title, "A post");
}

#[tokio::test]
async fn unpollable_sources_are_skipped() {
    let store = MemStore::new();
    let feed = StubFeed::new();
    let now = Utc::now();

    let mut pending = blog("Pending", "https://pending.example.com/feed");
    pending.approved = false;
    let mut retired = blog("Retired", "https://retired.example.com/feed");
    retired.active = false;
    let mut banned = blog("Banned", "https://banned.example.com/feed");
    banned.suspended = true;
    let live = blog("Live", "https://live.example.com/feed");

    for source in [&pending, &retired, &banned, &live] {
        store.add_source((*source).clone());
        feed.set_entries(
            &source.feed_url,
            vec![raw_entry(
                &format!("{} post", source.title),
                &format!("{}/post", source.url),
                now,
            )],
        );
    }

    let summary = engine(&store, &feed)
        .run_pass(SourceKinds::Blogs, now)
        .await
        .unwrap();

    assert_eq!(summary.sources_checked, 1);
    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Live post");
}
