//! Write results and the REST wire shapes.

use serde::{Deserialize, Serialize};

/// What a successful write changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteConfirmation {
    /// Paths touched by the write.
    pub paths: Vec<String>,
    pub branch: String,
    /// Branch head observed before the write, when it was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_commit: Option<String>,
    /// Commit created by the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    /// New revision marker of the file; absent after deletes and multi-file
    /// commits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sha: Option<String>,
}

impl std::fmt::Display for WriteConfirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.paths.join(", "), self.branch)?;
        if let Some(commit) = &self.commit_sha {
            write!(f, " @ {commit}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShaRef {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchResponse {
    pub commit: ShaRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentResponse {
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutContentRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentWriteResponse {
    #[serde(default)]
    pub content: Option<ShaRef>,
    pub commit: ShaRef,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteContentRequest<'a> {
    pub message: &'a str,
    pub sha: &'a str,
    pub branch: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefResponse {
    pub object: ShaRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitCommitResponse {
    pub sha: String,
    pub tree: ShaRef,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateBlobRequest {
    pub content: String,
    pub encoding: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TreeEntry<'a> {
    pub path: &'a str,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTreeRequest<'a> {
    pub base_tree: &'a str,
    pub tree: Vec<TreeEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCommitRequest<'a> {
    pub message: &'a str,
    pub tree: &'a str,
    pub parents: [&'a str; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRefRequest<'a> {
    pub sha: &'a str,
    pub force: bool,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
