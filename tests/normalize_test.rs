mod common;

use chrono::Utc;
use common::{blog, raw_entry};
use glamr_ingest::filter::{is_opted_out, OPT_OUT_TAGS};
use glamr_ingest::normalize::{normalize, normalize_tags, strip_markup, truncate_chars};

#[test]
fn guid_falls_back_to_link() {
    let now = Utc::now();
    let source = blog("Fallback", "https://fallback.example.com/feed");

    let mut raw = raw_entry("No id", "https://fallback.example.com/post", now);
    raw.guid = None;
    assert_eq!(
        normalize(&raw, &source, now).guid,
        "https://fallback.example.com/post"
    );

    raw.guid = Some("urn:uuid:abc".to_string());
    assert_eq!(normalize(&raw, &source, now).guid, "urn:uuid:abc");
}

#[test]
fn author_falls_back_to_source_then_empty() {
    let now = Utc::now();
    let mut source = blog("Authors", "https://authors.example.com/feed");
    let mut raw = raw_entry("Who wrote this", "https://authors.example.com/post", now);

    raw.author = Some("Robin".to_string());
    assert_eq!(normalize(&raw, &source, now).author_name, "Robin");

    raw.author = None;
    assert_eq!(normalize(&raw, &source, now).author_name, "Alex");

    source.author_name = None;
    assert_eq!(normalize(&raw, &source, now).author_name, "");
}

#[test]
fn description_prefers_summary_then_truncated_content() {
    let now = Utc::now();
    let source = blog("Describing", "https://describing.example.com/feed");
    let mut raw = raw_entry("Post", "https://describing.example.com/post", now);

    raw.summary = Some("<p>A <em>short</em> summary</p>".to_string());
    raw.content = Some("ignored".to_string());
    assert_eq!(
        normalize(&raw, &source, now).description,
        "A short summary"
    );

    raw.summary = None;
    raw.content = Some(format!("<div>{}</div>", "words ".repeat(100)));
    let description = normalize(&raw, &source, now).description;
    assert!(description.ends_with('\u{2026}'));
    assert_eq!(description.chars().count(), 201);

    raw.content = None;
    assert_eq!(normalize(&raw, &source, now).description, "");
}

#[test]
fn tags_are_lowercased_and_uncategorized_discarded() {
    let tags = normalize_tags(&[
        "Libraries".to_string(),
        "LIBRARIES".to_string(),
        "Uncategorized".to_string(),
        "GLAM".to_string(),
    ]);
    assert_eq!(tags, vec!["libraries".to_string(), "glam".to_string()]);
}

#[test]
fn markup_stripping_collapses_whitespace() {
    assert_eq!(
        strip_markup("<p>Hello  <a href='x'>world</a></p>\n<br/>again"),
        "Hello world again"
    );
    assert_eq!(strip_markup("plain text"), "plain text");
}

#[test]
fn truncation_respects_character_boundaries() {
    assert_eq!(truncate_chars("größer", 4), "größ");
    assert_eq!(truncate_chars("short", 200), "short");
}

#[test]
fn opt_out_matches_any_case() {
    assert!(is_opted_out(&["NotGLAM".to_string()]));
    assert!(is_opted_out(&["#notglam".to_string()]));
    assert!(is_opted_out(&[
        "libraries".to_string(),
        "NOTAUSGLAMR".to_string()
    ]));
    assert!(!is_opted_out(&["libraries".to_string(), "glam".to_string()]));
    assert!(!is_opted_out(&[]));
    assert_eq!(OPT_OUT_TAGS.len(), 6);
}
