//! Making titles safe to use as path segments.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("sanitizer pattern is valid")
}

/// Characters that are illegal or awkward in file names and URLs, plus ASCII
/// control characters.
static FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"[~^:*?\[\]\\/|<>".%\x00-\x1f\x7f]"#));

static LEADING_DOTS_SPACES: LazyLock<Regex> = LazyLock::new(|| compile(r"^[. ]+"));

/// Windows device names, alone or with an extension.
static RESERVED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$"));

/// Strip everything that cannot appear in a single path segment.
///
/// The result may be empty. Applying it twice gives the same result as
/// applying it once.
#[must_use]
pub fn sanitize_segment(input: &str) -> String {
    let cleaned = FORBIDDEN.replace_all(input, "");
    let cleaned = LEADING_DOTS_SPACES.replace(&cleaned, "");
    RESERVED.replace(&cleaned, "").into_owned()
}
