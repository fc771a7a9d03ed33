//! Heading rebase for independently drafted sections.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#+)[ \t]+(.+)$").expect("heading pattern is valid"));

/// Document sections start at `##`, one below the `#` title.
pub const DEFAULT_SECTION_LEVEL: usize = 2;

/// Shift every heading so the section's first heading lands at `target_top_level`.
///
/// No heading ends up above `target_top_level`. A body without headings is
/// returned unchanged.
pub fn normalize(body: &str, target_top_level: usize) -> String {
    if body.trim().is_empty() {
        return body.to_string();
    }

    let Some(first) = HEADING.captures(body) else {
        return body.to_string();
    };

    let shift = target_top_level as isize - first[1].len() as isize;
    tracing::debug!(shift, "rebasing section headings");

    HEADING
        .replace_all(body, |caps: &Captures<'_>| {
            let level = caps[1].len() as isize + shift;
            let level = level.max(target_top_level as isize) as usize;
            format!("{} {}", "#".repeat(level), &caps[2])
        })
        .into_owned()
}
