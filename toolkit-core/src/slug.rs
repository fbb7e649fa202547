use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ToolkitError, ToolkitResult};

// ASCII classes only: anything else, including non-Latin letters, separates words.
static NON_SLUG_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Lower-case `text` and collapse every run of characters outside
/// `[a-z0-9]` into a single `-`, trimming hyphens at both ends.
pub fn slugify(text: &str) -> ToolkitResult<String> {
    if text.is_empty() {
        return Err(ToolkitError::EmptyInput);
    }

    let lowered = text.to_lowercase();
    let slug = NON_SLUG_RUN.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        return Err(ToolkitError::EmptySlug);
    }
    Ok(slug.to_string())
}
