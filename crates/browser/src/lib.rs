//! Page fetching through headless Chrome/Chromium over CDP.
//!
//! [`ChromeFetcher`] either launches a local browser or connects to a remote
//! DevTools endpoint, loads the page, scrolls through it so lazy content
//! loads, rewrites the DOM for offline viewing and returns the final HTML.
//!
//! ```ignore
//! use pagekeep_browser::{ChromeFetcher, ContentFetcher, FetcherConfig};
//!
//! let fetcher = ChromeFetcher::new(FetcherConfig::default());
//! let html = fetcher.fetch("https://example.com/article").await?;
//! let text = pagekeep_browser::html_to_text(&html);
//! ```

pub mod detect;
pub mod endpoint;
pub mod error;
pub mod fetcher;
mod scripts;
pub mod text;

pub use {
    error::FetchError,
    fetcher::{ChromeFetcher, ContentFetcher, FetcherConfig},
    text::html_to_text,
};
