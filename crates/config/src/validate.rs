//! Configuration validation.
//!
//! Checks config files against the known schema, flags unknown or
//! misspelled fields, and verifies the service has the credentials it needs.

use std::{collections::HashMap, path::Path};

use secrecy::ExposeSecret;

use crate::{
    error::{Error, Result},
    schema::PagekeepConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "semantic", "missing"
    pub category: &'static str,
    /// Dotted path, e.g. "repository.ownr"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Expected shape of the configuration schema.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    let leaves = |keys: &[&'static str]| Struct(keys.iter().map(|k| (*k, Leaf)).collect());

    Struct(HashMap::from([
        (
            "summarizer",
            leaves(&[
                "api_key",
                "prompt",
                "base_url",
                "model",
                "timeout_secs",
                "max_attempts",
            ]),
        ),
        (
            "repository",
            leaves(&[
                "token",
                "owner",
                "name",
                "api_base",
                "branch",
                "timeout_secs",
            ]),
        ),
        ("backup", leaves(&["path_prefix"])),
        (
            "browser",
            leaves(&[
                "endpoint",
                "chrome_path",
                "mobile",
                "navigation_timeout_ms",
                "scroll_step_px",
                "scroll_delay_ms",
                "settle_ms",
            ]),
        ),
        ("correlation", leaves(&["window_secs"])),
        ("metrics", leaves(&["enabled", "listen"])),
    ]))
}

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

/// Validate a config file at the given path, or the discovered one if `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "syntax",
                path: String::new(),
                message: "no config file found; using defaults and environment".into(),
            }],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    let mut result = if is_toml {
        match std::fs::read_to_string(actual_path) {
            Ok(content) => validate_toml_str(&content),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message: format!("failed to read config file: {e}"),
                }],
                config_path: None,
            },
        }
    } else {
        let mut diagnostics = Vec::new();
        match crate::loader::load_config(actual_path) {
            Ok(config) => check_semantic_warnings(&config, &mut diagnostics),
            Err(e) => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "type-error",
                path: String::new(),
                message: e.to_string(),
            }),
        }
        ValidationResult {
            diagnostics,
            config_path: None,
        }
    };
    result.config_path = Some(actual_path.clone());
    result
}

/// Validate a TOML string without touching the filesystem.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    match toml::from_str::<PagekeepConfig>(toml_str) {
        Ok(config) => check_semantic_warnings(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
        } else {
            let message = match suggest(key, &known_keys, 3) {
                Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                None => "unknown field".to_string(),
            };
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "unknown-field",
                path,
                message,
            });
        }
    }
}

fn check_semantic_warnings(config: &PagekeepConfig, diagnostics: &mut Vec<Diagnostic>) {
    if config.correlation.window_secs <= 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "semantic",
            path: "correlation.window_secs".into(),
            message: "must be a positive number of seconds".into(),
        });
    }
    if config.summarizer.max_attempts == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "semantic",
            path: "summarizer.max_attempts".into(),
            message: "at least one attempt is required".into(),
        });
    }
    if url::Url::parse(&config.repository.api_base).is_err() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "semantic",
            path: "repository.api_base".into(),
            message: format!("not a valid URL: {}", config.repository.api_base),
        });
    }
    if url::Url::parse(&config.summarizer.base_url).is_err() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "semantic",
            path: "summarizer.base_url".into(),
            message: format!("not a valid URL: {}", config.summarizer.base_url),
        });
    }
    if config.backup.path_prefix.starts_with('/') || config.backup.path_prefix.ends_with('/') {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "semantic",
            path: "backup.path_prefix".into(),
            message: "leading/trailing slashes are stripped".into(),
        });
    }
    if let Some(listen) = &config.metrics.listen
        && listen.parse::<std::net::SocketAddr>().is_err()
    {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "semantic",
            path: "metrics.listen".into(),
            message: format!("not a socket address: {listen}"),
        });
    }
    if config.repository.token.is_some() || config.summarizer.api_key.is_some() {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "semantic",
            path: String::new(),
            message: "credentials stored in the config file; prefer environment variables".into(),
        });
    }
}

fn is_blank(secret: Option<&secrecy::Secret<String>>) -> bool {
    secret.is_none_or(|s| s.expose_secret().trim().is_empty())
}

/// Check that the running service has every credential and identifier it
/// needs. Lists all missing keys at once.
pub fn validate_for_service(config: &PagekeepConfig) -> Result<()> {
    let mut missing = Vec::new();
    if is_blank(config.summarizer.api_key.as_ref()) {
        missing.push("ZHIPUAI_KEY".to_string());
    }
    if is_blank(config.repository.token.as_ref()) {
        missing.push("GITHUB_TOKEN".to_string());
    }
    if config.repository.owner.trim().is_empty() {
        missing.push("GITHUB_USERNAME".to_string());
    }
    if config.repository.name.trim().is_empty() {
        missing.push("GITHUB_REPO".to_string());
    }
    if !missing.is_empty() {
        return Err(Error::Missing { keys: missing });
    }

    let mut diagnostics = Vec::new();
    check_semantic_warnings(config, &mut diagnostics);
    if let Some(d) = diagnostics.into_iter().find(|d| d.severity == Severity::Error) {
        return Err(Error::Invalid {
            key: d.path,
            message: d.message,
        });
    }
    Ok(())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, secrecy::Secret};

    fn ready_config() -> PagekeepConfig {
        let mut cfg = PagekeepConfig::default();
        cfg.summarizer.api_key = Some(Secret::new("zk".into()));
        cfg.repository.token = Some(Secret::new("ghp".into()));
        cfg.repository.owner = "alice".into();
        cfg.repository.name = "notes".into();
        cfg
    }

    #[test]
    fn service_ready_with_all_credentials() {
        validate_for_service(&ready_config()).unwrap();
    }

    #[test]
    fn missing_credentials_are_listed_together() {
        let err = validate_for_service(&PagekeepConfig::default()).unwrap_err();
        match err {
            Error::Missing { keys } => assert_eq!(
                keys,
                vec!["ZHIPUAI_KEY", "GITHUB_TOKEN", "GITHUB_USERNAME", "GITHUB_REPO"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let mut cfg = ready_config();
        cfg.repository.token = Some(Secret::new("  ".into()));
        let err = validate_for_service(&cfg).unwrap_err();
        assert!(matches!(err, Error::Missing { ref keys } if keys == &["GITHUB_TOKEN"]));
    }

    #[test]
    fn zero_window_is_invalid() {
        let mut cfg = ready_config();
        cfg.correlation.window_secs = 0;
        let err = validate_for_service(&cfg).unwrap_err();
        assert!(matches!(err, Error::Invalid { ref key, .. } if key == "correlation.window_secs"));
    }

    #[rstest]
    #[case("[repository]\nownr = \"x\"\n", "repository.ownr", Some("owner"))]
    #[case("[broswer]\nmobile = true\n", "broswer", Some("browser"))]
    #[case("[backup]\nzzzzzzzzzz = 1\n", "backup.zzzzzzzzzz", None)]
    fn unknown_fields_are_flagged(
        #[case] raw: &str,
        #[case] path: &str,
        #[case] hint: Option<&str>,
    ) {
        let result = validate_toml_str(raw);
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(diag.path, path);
        match hint {
            Some(h) => assert!(diag.message.contains(h)),
            None => assert_eq!(diag.message, "unknown field"),
        }
    }

    #[test]
    fn syntax_error_short_circuits() {
        let result = validate_toml_str("[repository\n");
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn type_error_reported() {
        let result = validate_toml_str("[correlation]\nwindow_secs = \"thirty\"\n");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "type-error")
        );
    }

    #[test]
    fn clean_file_has_no_errors() {
        let result = validate_toml_str("[backup]\npath_prefix = \"docs/wechat\"\n");
        assert!(!result.has_errors());
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("owner", "ownr"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
