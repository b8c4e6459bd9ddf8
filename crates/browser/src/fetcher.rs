//! Loading a page in headless Chrome and capturing its final HTML.

use std::{path::PathBuf, time::Duration};

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::browser_protocol::{
            emulation::SetDeviceMetricsOverrideParams, network::SetUserAgentOverrideParams,
        },
        handler::{Handler, HandlerConfig, viewport::Viewport},
    },
    futures::StreamExt,
    pagekeep_config::BrowserConfig,
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use crate::{endpoint, error::FetchError, scripts};

/// Mobile Safari identity presented in mobile mode, so article hosts serve
/// their lightweight layout.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 11_0 like Mac OS X) \
     AppleWebKit/604.1.38 (KHTML, like Gecko) Version/11.0 Mobile/15A372 Safari/604.1";

const MOBILE_WIDTH: u32 = 414;
const MOBILE_HEIGHT: u32 = 896;
const DESKTOP_WIDTH: u32 = 1280;
const DESKTOP_HEIGHT: u32 = 800;

/// Retrieves the rendered HTML of a web page.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Runtime settings for [`ChromeFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Remote DevTools endpoint. A local browser is launched when unset.
    pub endpoint: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub mobile: bool,
    pub navigation_timeout: Duration,
    pub scroll_step_px: u32,
    pub scroll_delay: Duration,
    /// Pause after scrolling so late requests settle.
    pub settle: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for FetcherConfig {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            chrome_path: config.chrome_path.as_ref().map(PathBuf::from),
            mobile: config.mobile,
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            scroll_step_px: config.scroll_step_px,
            scroll_delay: Duration::from_millis(config.scroll_delay_ms),
            settle: Duration::from_millis(config.settle_ms),
        }
    }
}

impl FetcherConfig {
    fn viewport(&self) -> Viewport {
        let (width, height) = if self.mobile {
            (MOBILE_WIDTH, MOBILE_HEIGHT)
        } else {
            (DESKTOP_WIDTH, DESKTOP_HEIGHT)
        };
        Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: self.mobile,
            is_landscape: !self.mobile,
            has_touch: self.mobile,
        }
    }
}

/// Only absolute http(s) URLs are fetched.
pub fn validate_url(raw: &str) -> Result<url::Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let parsed = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// One browser connection, torn down after each fetch.
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    /// Launched locally, so closing it is ours to do.
    owned: bool,
}

impl Session {
    async fn shutdown(mut self) {
        if self.owned {
            if let Err(e) = self.browser.close().await {
                warn!(error = %e, "failed to close browser");
            }
            if let Err(e) = self.browser.wait().await {
                warn!(error = %e, "failed to reap browser process");
            }
        }
        self.handler.abort();
    }
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!(error = %e, "browser handler event error");
            }
        }
        debug!("browser event handler exited");
    })
}

/// [`ContentFetcher`] backed by Chrome/Chromium over CDP.
pub struct ChromeFetcher {
    config: FetcherConfig,
    http: reqwest::Client,
}

impl ChromeFetcher {
    #[must_use]
    pub fn new(config: FetcherConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(FetcherConfig::from(config))
    }

    async fn open(&self) -> Result<Session, FetchError> {
        match &self.config.endpoint {
            Some(endpoint) => self.connect(endpoint).await,
            None => self.launch().await,
        }
    }

    async fn connect(&self, endpoint: &str) -> Result<Session, FetchError> {
        let ws_url = endpoint::resolve_ws_endpoint(&self.http, endpoint).await?;
        info!(ws_url, "connecting to remote browser");

        let handler_config = HandlerConfig {
            request_timeout: self.config.navigation_timeout,
            viewport: Some(self.config.viewport()),
            ..Default::default()
        };
        let (browser, handler) = Browser::connect_with_config(&ws_url, handler_config)
            .await
            .map_err(|e| FetchError::ConnectFailed {
                endpoint: ws_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Session {
            browser,
            handler: spawn_handler(handler),
            owned: false,
        })
    }

    async fn launch(&self) -> Result<Session, FetchError> {
        let executable = crate::detect::locate_chrome(self.config.chrome_path.as_deref())?;
        info!(path = %executable.display(), mobile = self.config.mobile, "launching browser");

        let mut builder = CdpBrowserConfig::builder()
            .chrome_executable(executable)
            .viewport(self.config.viewport())
            .request_timeout(self.config.navigation_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");
        if self.config.mobile {
            builder = builder.arg(format!("--user-agent={MOBILE_USER_AGENT}"));
        }

        let config = builder
            .build()
            .map_err(|e| FetchError::LaunchFailed(format!("invalid browser config: {e}")))?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::LaunchFailed(e.to_string()))?;

        Ok(Session {
            browser,
            handler: spawn_handler(handler),
            owned: true,
        })
    }

    async fn prepare_page(&self, page: &Page) -> Result<(), FetchError> {
        let viewport = self.config.viewport();
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(self.config.mobile)
            .build()
            .map_err(FetchError::Cdp)?;
        page.execute(metrics).await?;

        if self.config.mobile {
            page.execute(SetUserAgentOverrideParams::new(MOBILE_USER_AGENT))
                .await?;
        }
        Ok(())
    }

    async fn evaluate_js<T: serde::de::DeserializeOwned>(
        page: &Page,
        expression: impl Into<String>,
    ) -> Result<T, FetchError> {
        page.evaluate(expression.into())
            .await
            .map_err(|e| FetchError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| FetchError::JsEvalFailed(e.to_string()))
    }

    /// Scroll top to bottom so lazy-loaded images and sections render.
    async fn scroll_through(&self, page: &Page) -> Result<(), FetchError> {
        let height: f64 = Self::evaluate_js(page, scripts::SCROLL_HEIGHT_JS).await?;
        let height = height.max(0.0) as i64;
        let step = i64::from(self.config.scroll_step_px.max(1));
        debug!(height, step, "scrolling page");

        let mut y = 0;
        while y < height {
            let _: bool = Self::evaluate_js(page, scripts::scroll_to_js(y)).await?;
            tokio::time::sleep(self.config.scroll_delay).await;
            y += step;
        }
        tokio::time::sleep(self.config.settle).await;
        Ok(())
    }

    async fn render(&self, page: &Page, url: &url::Url) -> Result<String, FetchError> {
        self.prepare_page(page).await?;

        tokio::time::timeout(self.config.navigation_timeout, page.goto(url.as_str()))
            .await
            .map_err(|_| {
                FetchError::Timeout(format!(
                    "navigation to {url} exceeded {}ms",
                    self.config.navigation_timeout.as_millis()
                ))
            })?
            .map_err(|e| FetchError::NavigationFailed(e.to_string()))?;

        self.scroll_through(page).await?;

        let _: bool = Self::evaluate_js(page, scripts::REWRITE_DOM_JS).await?;
        Ok(page.content().await?)
    }

    /// Render `url` in a fresh tab. The tab is closed on every path; a shared
    /// remote browser would otherwise keep it open.
    async fn capture(&self, session: &Session, url: &url::Url) -> Result<String, FetchError> {
        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::NavigationFailed(e.to_string()))?;
        close_after(self.render(&page, url), page.clone().close()).await
    }
}

/// Await `work`, then `close`, whatever `work` returned.
async fn close_after<T, E: std::fmt::Display>(
    work: impl Future<Output = Result<T, FetchError>>,
    close: impl Future<Output = Result<(), E>>,
) -> Result<T, FetchError> {
    let result = work.await;
    if let Err(e) = close.await {
        debug!(error = %e, "failed to close page");
    }
    result
}

#[async_trait]
impl ContentFetcher for ChromeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = validate_url(url)?;
        let session = self.open().await?;
        let result = self.capture(&session, &url).await;
        session.shutdown().await;

        match &result {
            Ok(html) => info!(%url, bytes = html.len(), "page captured"),
            Err(e) => warn!(%url, error = %e, "page capture failed"),
        }
        result
    }
}
