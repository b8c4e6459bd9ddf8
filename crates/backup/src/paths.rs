//! Archive locations inside the repository.

use crate::sanitize::sanitize_segment;

/// Segment used when a source or title sanitizes to nothing.
pub const FALLBACK_SEGMENT: &str = "untitled";

/// Where an archived page lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePath {
    /// Repository path as written to the store.
    pub raw: String,
    /// Same path with the source and title percent-encoded, for links.
    pub encoded: String,
}

fn segment(value: &str) -> String {
    let cleaned = sanitize_segment(value);
    if cleaned.is_empty() {
        FALLBACK_SEGMENT.to_string()
    } else {
        cleaned
    }
}

impl ArchivePath {
    /// `{prefix}/{source}/{title}.html`. The prefix is used verbatim apart
    /// from surrounding slashes.
    #[must_use]
    pub fn new(prefix: &str, source: &str, title: &str) -> Self {
        let source = segment(source);
        let title = segment(title);
        let prefix = prefix.trim_matches('/');
        let join = |source: &str, title: &str| {
            if prefix.is_empty() {
                format!("{source}/{title}.html")
            } else {
                format!("{prefix}/{source}/{title}.html")
            }
        };
        Self {
            raw: join(&source, &title),
            encoded: join(&urlencoding::encode(&source), &urlencoding::encode(&title)),
        }
    }
}
