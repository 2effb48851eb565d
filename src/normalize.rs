use crate::models::Source;
use crate::types::{CanonicalEntry, RawEntry};
use chrono::{DateTime, Utc};

const DESCRIPTION_LIMIT: usize = 200;
const ELLIPSIS: char = '\u{2026}';

/// Taxonomy noise emitted by some platforms for untagged posts.
const DISCARDED_TERM: &str = "uncategorized";

/// Apply the normalization rules to one raw entry, in order: GUID falls back
/// to the link, author falls back to the source's configured author, the
/// description is the first non-empty of summary / truncated content with
/// markup stripped, and taxonomy terms become lowercase tags.
pub fn normalize(raw: &RawEntry, source: &Source, now: DateTime<Utc>) -> CanonicalEntry {
    let guid = raw.guid.clone().unwrap_or_else(|| raw.url.clone());

    let author_name = raw
        .author
        .clone()
        .or_else(|| source.author_name.clone())
        .unwrap_or_default();

    let description = match &raw.summary {
        Some(summary) if !summary.trim().is_empty() => strip_markup(summary),
        _ => match &raw.content {
            Some(content) if !content.trim().is_empty() => {
                let mut text = truncate_chars(&strip_markup(content), DESCRIPTION_LIMIT);
                text.push(ELLIPSIS);
                text
            }
            _ => String::new(),
        },
    };

    let tags = normalize_tags(&raw.categories);

    let pubdate = raw.published.or(raw.updated).unwrap_or(now);
    let updateddate = raw.updated.or(raw.published).unwrap_or(now);

    CanonicalEntry {
        title: raw.title.clone(),
        author_name,
        url: raw.url.clone(),
        guid,
        description,
        pubdate,
        updateddate,
        tags,
    }
}

/// Lowercase, dedup and discard the platform filler term.
pub fn normalize_tags(terms: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for term in terms {
        let tag = term.to_lowercase();
        if tag == DISCARDED_TERM || tag.trim().is_empty() {
            continue;
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Remove markup and collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    html.chars()
        .fold((String::new(), false), |(mut text, in_tag), c| match c {
            '<' => (text, true),
            '>' => (text, false),
            _ if !in_tag => {
                text.push(c);
                (text, in_tag)
            }
            _ => (text, in_tag),
        })
        .0
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate on a character boundary, not a byte boundary.
pub fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
