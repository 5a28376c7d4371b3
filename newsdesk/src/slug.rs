//! URL slugs and category path segments.

/// Turn a headline into a URL slug: lower-cased, with every run of
/// characters outside `[a-z0-9]` collapsed to a single `-` and no
/// leading or trailing `-`.
///
/// ```
/// assert_eq!(newsdesk::slug::slugify("Lake Levels: 2024's Record!"), "lake-levels-2024-s-record");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Category name as it appears in a URL, e.g. `Human Rights` becomes
/// `human-rights`.
pub fn category_segment(category: &str) -> String {
    category
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Category name to look up for a URL segment. Matching against stored
/// categories is case-insensitive, so only the separators are restored.
pub fn category_from_segment(segment: &str) -> String {
    segment.trim().replace('-', " ")
}

/// Heading for a category page: hyphens become spaces and the first
/// letter is capitalized.
pub fn category_title(segment: &str) -> String {
    let spaced = segment.trim().replace('-', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Slug with a numeric suffix, used to disambiguate `-2`, `-3`, ...
pub(crate) fn with_suffix(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}
