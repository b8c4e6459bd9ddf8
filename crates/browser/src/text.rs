//! Plain-text extraction from rendered HTML.

/// Tags that start a new line in the extracted text.
const BLOCK_TAGS: &[&str] = &[
    "br", "p", "div", "section", "article", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "pre", "table", "ul", "ol",
];

/// `true` when `rest` (lowercased, starting at `<`) opens or closes `name`.
fn is_tag(rest: &str, name: &str) -> bool {
    let body = rest
        .strip_prefix("</")
        .or_else(|| rest.strip_prefix('<'))
        .unwrap_or(rest);
    body.strip_prefix(name)
        .and_then(|after| after.chars().next())
        .is_some_and(|c| !c.is_ascii_alphanumeric())
}

fn decode_entity(entity: &str) -> Option<char> {
    let name = entity.strip_prefix('&')?.strip_suffix(';')?;
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        },
    }
}

/// Strip markup from `html`, dropping script and style content.
///
/// Whitespace runs collapse to a single space and block-level tags become
/// line breaks, so paragraphs stay separated.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut result = String::with_capacity(html.len() / 2);
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;
    let mut last_was_space = true;
    let mut skip_until = 0;

    for (i, ch) in html.char_indices() {
        if i < skip_until {
            continue;
        }

        if ch == '<' {
            let rest = &lower[i..];
            if rest.starts_with("</script") {
                in_script = false;
            } else if is_tag(rest, "script") {
                in_script = true;
            }
            if rest.starts_with("</style") {
                in_style = false;
            } else if is_tag(rest, "style") {
                in_style = true;
            }

            if !in_script && !in_style && BLOCK_TAGS.iter().any(|t| is_tag(rest, t)) {
                while result.ends_with(' ') {
                    result.pop();
                }
                if !result.is_empty() && !result.ends_with('\n') {
                    result.push('\n');
                }
                last_was_space = true;
            }

            in_tag = true;
            continue;
        }

        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }

        if in_script || in_style {
            continue;
        }

        if ch == '&' {
            let rest = &html[i..];
            if let Some(semi) = rest.find(';').filter(|&s| s <= 10)
                && let Some(decoded) = decode_entity(&rest[..=semi])
            {
                skip_until = i + semi + 1;
                if decoded.is_whitespace() {
                    if !last_was_space {
                        result.push(' ');
                        last_was_space = true;
                    }
                } else {
                    result.push(decoded);
                    last_was_space = false;
                }
                continue;
            }
        }

        if ch.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }

    result
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
