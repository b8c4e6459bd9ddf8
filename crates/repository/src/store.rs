use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{Result, types::WriteConfirmation};

/// Read-modify-write access to a versioned file store.
///
/// Paths are repository-relative and unencoded (`docs/a b/c.html`).
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Current content of `path`, or `None` when it does not exist.
    async fn get(&self, path: &str) -> Result<Option<String>>;

    /// Write `content` to `path`, creating it or replacing the current
    /// revision.
    async fn create_or_update(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<WriteConfirmation>;

    /// Write `content` with an explicit revision marker. `sha` must be `None`
    /// for new files and the current marker for existing ones.
    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        sha: Option<&str>,
    ) -> Result<WriteConfirmation>;

    /// Delete an existing file.
    async fn delete(&self, path: &str, message: &str) -> Result<WriteConfirmation>;

    /// Write every file in `files` as a single commit.
    async fn commit_multiple(
        &self,
        files: &BTreeMap<String, Vec<u8>>,
        message: &str,
    ) -> Result<WriteConfirmation>;
}
