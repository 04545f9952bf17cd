//! Shared helpers for tag names.

/// Normalize a tag reference the way the site stores tag names.
///
/// Trims surrounding whitespace, collapses inner whitespace runs into a
/// single underscore and lowercases the result.
///
/// # Examples
///
/// ```
/// use dtext::normalize_tag_name;
///
/// assert_eq!(normalize_tag_name("  Blue   Sky "), "blue_sky");
/// assert_eq!(normalize_tag_name("tag_name"), "tag_name");
/// ```
#[must_use]
pub fn normalize_tag_name(name: &str) -> String {
    name.split_whitespace()
        .flat_map(|word| std::iter::once('_').chain(word.chars().flat_map(char::to_lowercase)))
        .skip(1)
        .collect()
}
