/// Config schema types (summarizer, repository, backup, browser, correlation).
use {secrecy::Secret, serde::Deserialize};

/// Prompt prepended to the page text when summarizing.
pub const DEFAULT_PROMPT: &str = "请帮我总结一下这篇文章\n";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PagekeepConfig {
    pub summarizer: SummarizerConfig,
    pub repository: RepositoryConfig,
    pub backup: BackupConfig,
    pub browser: BrowserConfig,
    pub correlation: CorrelationConfig,
    pub metrics: MetricsConfig,
}

/// Text-generation API used for summaries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// API key (`ZHIPUAI_KEY`).
    pub api_key: Option<Secret<String>>,
    /// Prompt prefixed to the extracted page text (`AI_PROMPT`).
    pub prompt: String,
    /// OpenAI-compatible base URL; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Attempts before giving up on a summary.
    pub max_attempts: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            prompt: DEFAULT_PROMPT.into(),
            base_url: "https://open.bigmodel.cn/api/paas/v4".into(),
            model: "glm-4-flash".into(),
            timeout_secs: 120,
            max_attempts: 3,
        }
    }
}

/// GitHub-compatible repository the archived pages are committed to.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Access token (`GITHUB_TOKEN`).
    pub token: Option<Secret<String>>,
    /// Repository owner (`GITHUB_USERNAME`).
    pub owner: String,
    /// Repository name (`GITHUB_REPO`).
    pub name: String,
    /// REST API base without trailing slash (`GITHUB_API_BASE`).
    pub api_base: String,
    pub branch: String,
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: String::new(),
            name: String::new(),
            api_base: "https://api.github.com".into(),
            branch: "master".into(),
            timeout_secs: 30,
        }
    }
}

/// Where archived pages land inside the repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Path prefix without leading/trailing slashes (`GITHUB_PATH_PREFIX`).
    /// Full path: `{path_prefix}/{source}/{title}.html`.
    pub path_prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            path_prefix: "docs/wechat".into(),
        }
    }
}

/// Headless browser used to render pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Remote DevTools endpoint (`ws://…` or `http://host:9222`). When unset a
    /// local Chrome/Chromium is launched.
    pub endpoint: Option<String>,
    /// Explicit Chrome binary for local launches.
    pub chrome_path: Option<String>,
    /// Emulate a phone viewport and user agent.
    pub mobile: bool,
    pub navigation_timeout_ms: u64,
    /// Pixels per scroll step while simulating reading.
    pub scroll_step_px: u32,
    /// Pause after each scroll step.
    pub scroll_delay_ms: u64,
    /// Wait after scrolling before the DOM is captured.
    pub settle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            chrome_path: None,
            mobile: false,
            navigation_timeout_ms: 60_000,
            scroll_step_px: 200,
            scroll_delay_ms: 200,
            settle_ms: 5_000,
        }
    }
}

/// Command/link pairing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Maximum timestamp skew between a command and a link, exclusive.
    pub window_secs: i64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self { window_secs: 30 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Prometheus scrape address, e.g. `127.0.0.1:9464`.
    pub listen: Option<String>,
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PagekeepConfig::default();
        assert_eq!(cfg.backup.path_prefix, "docs/wechat");
        assert_eq!(cfg.repository.api_base, "https://api.github.com");
        assert_eq!(cfg.repository.branch, "master");
        assert_eq!(cfg.correlation.window_secs, 30);
        assert_eq!(cfg.summarizer.max_attempts, 3);
        assert_eq!(cfg.browser.scroll_step_px, 200);
        assert_eq!(cfg.browser.settle_ms, 5_000);
        assert!(cfg.repository.token.is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let raw = r#"
            [repository]
            token = "ghp_abc"
            owner = "alice"
            name = "notes"

            [browser]
            mobile = true
        "#;
        let cfg: PagekeepConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.repository.token.unwrap().expose_secret(), "ghp_abc");
        assert_eq!(cfg.repository.owner, "alice");
        assert_eq!(cfg.repository.branch, "master");
        assert!(cfg.browser.mobile);
        assert_eq!(cfg.summarizer.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = RepositoryConfig {
            token: Some(Secret::new("ghp_secret".into())),
            ..Default::default()
        };
        assert!(!format!("{cfg:?}").contains("ghp_secret"));
    }
}
