/// Taxonomy terms that opt a post out of the directory entirely. An entry
/// carrying any of these is not stored, not counted and not announced.
pub const OPT_OUT_TAGS: [&str; 6] = [
    "notglam",
    "notglamr",
    "notausglamblogs",
    "notausglamr",
    "notglamblogs",
    "#notglam",
];

/// Check raw taxonomy terms (tags and categories alike) against the opt-out
/// vocabulary, case-insensitively. Runs before normalization so that a term
/// which would not survive into a tag row still opts the entry out.
pub fn is_opted_out(terms: &[String]) -> bool {
    terms
        .iter()
        .any(|term| OPT_OUT_TAGS.contains(&term.to_lowercase().as_str()))
}
