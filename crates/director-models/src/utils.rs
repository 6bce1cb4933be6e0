//! Small helpers shared across crates.

/// Maximum length of a sanitized filename stem.
pub const MAX_FILENAME_LEN: usize = 50;

/// Sanitize a title or label for use in filenames.
///
/// Only ASCII alphanumerics, hyphen, underscore and space survive; whitespace
/// runs become a single underscore and the result is lowercased. Falls back
/// to `"untitled"` when nothing is left.
pub fn sanitize_filename(title: &str) -> String {
    let slug: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .take(MAX_FILENAME_LEN)
        .collect();

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}
