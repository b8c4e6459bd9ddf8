use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::PagekeepConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "pagekeep.toml",
    "pagekeep.yaml",
    "pagekeep.yml",
    "pagekeep.json",
];

/// Environment variables read by [`apply_env_overrides`].
pub const ENV_KEYS: &[&str] = &[
    "ZHIPUAI_KEY",
    "SUMMARIZER_API_KEY",
    "AI_PROMPT",
    "SUMMARIZER_BASE_URL",
    "SUMMARIZER_MODEL",
    "GITHUB_TOKEN",
    "GITHUB_USERNAME",
    "GITHUB_REPO",
    "GITHUB_API_BASE",
    "GITHUB_BRANCH",
    "GITHUB_PATH_PREFIX",
    "BROWSER_ENDPOINT",
    "SELENIUM_SERVER",
    "BROWSER_MOBILE",
    "CORRELATION_WINDOW_SECS",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<PagekeepConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./pagekeep.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/pagekeep/pagekeep.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PagekeepConfig::default()` if no config file is found.
pub fn discover_and_load() -> PagekeepConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    PagekeepConfig::default()
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/pagekeep/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pagekeep").map(|d| d.config_dir().to_path_buf())
}

/// Overlay process environment variables onto `config`.
pub fn apply_env_overrides(config: &mut PagekeepConfig) -> Result<()> {
    apply_env_overrides_with(config, |key| std::env::var(key).ok())
}

/// Overlay variables from `lookup` onto `config`. Empty values count as unset.
pub fn apply_env_overrides_with(
    config: &mut PagekeepConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("ZHIPUAI_KEY").or_else(|| get("SUMMARIZER_API_KEY")) {
        config.summarizer.api_key = Some(Secret::new(key));
    }
    if let Some(prompt) = get("AI_PROMPT") {
        config.summarizer.prompt = prompt;
    }
    if let Some(base) = get("SUMMARIZER_BASE_URL") {
        config.summarizer.base_url = base.trim_end_matches('/').to_string();
    }
    if let Some(model) = get("SUMMARIZER_MODEL") {
        config.summarizer.model = model;
    }

    if let Some(token) = get("GITHUB_TOKEN") {
        config.repository.token = Some(Secret::new(token));
    }
    if let Some(owner) = get("GITHUB_USERNAME") {
        config.repository.owner = owner;
    }
    if let Some(name) = get("GITHUB_REPO") {
        config.repository.name = name;
    }
    if let Some(base) = get("GITHUB_API_BASE") {
        config.repository.api_base = base.trim_end_matches('/').to_string();
    }
    if let Some(branch) = get("GITHUB_BRANCH") {
        config.repository.branch = branch;
    }
    if let Some(prefix) = get("GITHUB_PATH_PREFIX") {
        config.backup.path_prefix = prefix.trim_matches('/').to_string();
    }

    if let Some(endpoint) = get("BROWSER_ENDPOINT").or_else(|| get("SELENIUM_SERVER")) {
        config.browser.endpoint = Some(endpoint);
    }
    if let Some(raw) = get("BROWSER_MOBILE") {
        config.browser.mobile = parse_bool(&raw).ok_or_else(|| Error::Invalid {
            key: "BROWSER_MOBILE".into(),
            message: format!("expected a boolean, got {raw:?}"),
        })?;
    }
    if let Some(raw) = get("CORRELATION_WINDOW_SECS") {
        config.correlation.window_secs = raw.trim().parse().map_err(|e| Error::Invalid {
            key: "CORRELATION_WINDOW_SECS".into(),
            message: format!("{e}"),
        })?;
    }

    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<PagekeepConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let parse_err = |message: String| Error::Parse {
        path: path.to_path_buf(),
        message,
    };

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string())),
        _ => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}
