//! Reply texts sent back to the sender.

use std::fmt::Display;

#[must_use]
pub fn fetch_failed(url: &str, error: impl Display) -> String {
    format!("{url} fetch failed!\n\n{error}")
}

#[must_use]
pub fn summary(content: &str, usage: &str) -> String {
    format!("{content}\n\n{usage}")
}

#[must_use]
pub fn summary_failed(error: &str) -> String {
    format!("Summary generation failed, please try again later.\n\n{error}")
}

/// Links to the archived copy: the blob view and the Pages site.
#[must_use]
pub fn backup_done(url: &str, owner: &str, repo: &str, branch: &str, encoded_path: &str) -> String {
    format!(
        "origin_url: {url}\n\n\
         commit_url: https://github.com/{owner}/{repo}/blob/{branch}/{encoded_path}\n\n\
         page_url: https://{owner}.github.io/{repo}/{encoded_path}"
    )
}

#[must_use]
pub fn backup_failed(error: impl Display) -> String {
    format!("Backup failed, please try again later. {error}")
}
