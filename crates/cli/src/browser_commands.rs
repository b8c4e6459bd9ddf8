//! `pagekeep fetch`: render one page through the configured browser.

use {
    anyhow::Result,
    pagekeep_browser::{ChromeFetcher, ContentFetcher, FetcherConfig, detect, html_to_text},
    pagekeep_config::PagekeepConfig,
};

pub async fn fetch(config: &PagekeepConfig, url: &str, mobile: bool, text: bool) -> Result<()> {
    let mut fetcher_config = FetcherConfig::from(&config.browser);
    fetcher_config.mobile |= mobile;

    if fetcher_config.endpoint.is_none() {
        detect::check_and_warn(fetcher_config.chrome_path.as_deref());
    }

    let html = ChromeFetcher::new(fetcher_config).fetch(url).await?;
    if text {
        println!("{}", html_to_text(&html));
    } else {
        println!("{html}");
    }
    Ok(())
}
