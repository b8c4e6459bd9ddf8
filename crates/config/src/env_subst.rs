/// Expand `${VAR}` and `${VAR:-fallback}` placeholders in raw config text.
///
/// A variable that is unset or blank counts as missing, the same rule the
/// environment overrides apply. A missing variable without a fallback keeps
/// its placeholder so validation can point at it.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body_start = start + 2;
        let Some(len) = rest[body_start..].find('}') else {
            // Unterminated: the remainder is literal.
            out.push_str(&rest[start..]);
            return out;
        };
        let body = &rest[body_start..body_start + len];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };
        let value = (!name.is_empty())
            .then(|| lookup(name))
            .flatten()
            .filter(|v| !v.trim().is_empty());
        match (value, fallback) {
            (Some(value), _) => out.push_str(&value),
            (None, Some(fallback)) if !name.is_empty() => out.push_str(fallback),
            _ => out.push_str(&rest[start..=body_start + len]),
        }
        rest = &rest[body_start + len + 1..];
    }

    out.push_str(rest);
    out
}
