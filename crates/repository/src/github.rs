//! GitHub REST implementation of [`RepositoryStore`].

use std::{collections::BTreeMap, iter, time::Duration};

use {
    async_trait::async_trait,
    base64::{Engine as _, engine::general_purpose::STANDARD as BASE64},
    pagekeep_config::RepositoryConfig,
    reqwest::{Method, RequestBuilder, Response, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::{Serialize, de::DeserializeOwned},
    tracing::{debug, info, warn},
    url::Url,
};

#[cfg(feature = "metrics")]
use pagekeep_metrics::{counter, labels, store as store_metrics};

use crate::{
    error::{Result, StoreError},
    store::RepositoryStore,
    types::{
        ApiErrorBody, BranchResponse, ContentResponse, ContentWriteResponse, CreateBlobRequest,
        CreateCommitRequest, CreateTreeRequest, DeleteContentRequest, GitCommitResponse,
        PutContentRequest, RefResponse, ShaRef, TreeEntry, UpdateRefRequest, WriteConfirmation,
    },
};

const USER_AGENT: &str = concat!("pagekeep/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Non-empty segments of a repository-relative path.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn normalize_path(path: &str) -> Result<String> {
    let normalized = split_path(path).collect::<Vec<_>>().join("/");
    if normalized.is_empty() {
        return Err(StoreError::invalid_input(format!("empty path: {path:?}")));
    }
    Ok(normalized)
}

/// Map a failed response onto the error taxonomy.
fn classify_failure(
    method: &Method,
    url: &Url,
    status: StatusCode,
    subject: &str,
    message: String,
) -> StoreError {
    let lower = message.to_ascii_lowercase();
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound {
            path: subject.to_string(),
        },
        StatusCode::CONFLICT => StoreError::Conflict {
            path: subject.to_string(),
            message,
        },
        StatusCode::UNPROCESSABLE_ENTITY
            if lower.contains("sha") || lower.contains("fast forward") =>
        {
            StoreError::Conflict {
                path: subject.to_string(),
                message,
            }
        },
        _ => StoreError::Http {
            method: method.to_string(),
            endpoint: url.path().to_string(),
            status: status.as_u16(),
            message,
        },
    }
}

/// A repository on GitHub (or a GitHub Enterprise API base).
pub struct GitHubRepository {
    client: reqwest::Client,
    api_base: Url,
    owner: String,
    repo: String,
    branch: String,
    token: Secret<String>,
}

impl GitHubRepository {
    pub fn new(config: &RepositoryConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.expose_secret().trim().is_empty())
            .ok_or_else(|| StoreError::invalid_input("repository token is not configured"))?;
        if config.owner.trim().is_empty() || config.name.trim().is_empty() {
            return Err(StoreError::invalid_input(
                "repository owner and name must be configured",
            ));
        }
        if config.branch.trim().is_empty() {
            return Err(StoreError::invalid_input("branch must not be empty"));
        }
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            StoreError::invalid_input(format!("invalid api base {}: {e}", config.api_base))
        })?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| StoreError::Transport {
                endpoint: config.api_base.clone(),
                source,
            })?;

        Ok(Self {
            client,
            api_base,
            owner: config.owner.trim().to_string(),
            repo: config.name.trim().to_string(),
            branch: config.branch.trim().to_string(),
            token,
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// `{api_base}/repos/{owner}/{repo}/{segments…}`, each segment encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                StoreError::invalid_input(format!("{} cannot be a base URL", self.api_base))
            })?;
            path.pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str()])
                .extend(segments.into_iter().filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> Result<Url> {
        self.endpoint(iter::once("contents").chain(split_path(path)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .bearer_auth(self.token.expose_secret())
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        method: &Method,
        url: &Url,
        subject: &str,
    ) -> Result<Response> {
        #[cfg(feature = "metrics")]
        counter!(store_metrics::REQUESTS_TOTAL, labels::METHOD => method.to_string()).increment(1);
        debug!(%method, endpoint = %url.path(), "repository request");

        let response = builder
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                endpoint: url.path().to_string(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        let err = classify_failure(method, url, status, subject, message);
        if matches!(err, StoreError::Conflict { .. }) {
            warn!(path = subject, status = status.as_u16(), "stale revision rejected");
            #[cfg(feature = "metrics")]
            counter!(store_metrics::CONFLICTS_TOTAL).increment(1);
        }
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, subject: &str) -> Result<T> {
        let builder = self.request(Method::GET, url.clone());
        let response = self.execute(builder, &Method::GET, &url, subject).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::decode(subject, e))
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        subject: &str,
    ) -> Result<T> {
        let builder = self.request(method.clone(), url.clone()).json(body);
        let response = self.execute(builder, &method, &url, subject).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::decode(subject, e))
    }

    /// Current head commit of the configured branch.
    pub async fn branch_head(&self) -> Result<String> {
        let url = self.endpoint(iter::once("branches").chain(split_path(&self.branch)))?;
        let branch: BranchResponse = self.get_json(url, &self.branch).await?;
        Ok(branch.commit.sha)
    }

    /// File metadata, or `None` when the file does not exist.
    async fn file_meta(&self, path: &str) -> Result<Option<ContentResponse>> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.branch);
        match self.get_json::<ContentResponse>(url, path).await {
            Ok(meta) => Ok(Some(meta)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn commit_saga(
        &self,
        files: &BTreeMap<String, Vec<u8>>,
        message: &str,
    ) -> Result<WriteConfirmation> {
        let heads: Vec<&str> = ["git", "ref", "heads"]
            .into_iter()
            .chain(split_path(&self.branch))
            .collect();
        let tip: RefResponse = self.get_json(self.endpoint(heads)?, &self.branch).await?;
        let tip = tip.object.sha;

        let base: GitCommitResponse = self
            .get_json(self.endpoint(["git", "commits", tip.as_str()])?, &tip)
            .await?;
        debug!(branch = %self.branch, tip = %tip, base_tree = %base.tree.sha, "building commit");

        let mut entries = Vec::with_capacity(files.len());
        for (path, content) in files {
            let blob: ShaRef = self
                .send_json(
                    Method::POST,
                    self.endpoint(["git", "blobs"])?,
                    &CreateBlobRequest {
                        content: BASE64.encode(content),
                        encoding: "base64",
                    },
                    path,
                )
                .await?;
            entries.push(TreeEntry {
                path: path.as_str(),
                mode: "100644",
                kind: "blob",
                sha: blob.sha,
            });
        }

        let tree: ShaRef = self
            .send_json(
                Method::POST,
                self.endpoint(["git", "trees"])?,
                &CreateTreeRequest {
                    base_tree: &base.tree.sha,
                    tree: entries,
                },
                "tree",
            )
            .await?;

        let commit: ShaRef = self
            .send_json(
                Method::POST,
                self.endpoint(["git", "commits"])?,
                &CreateCommitRequest {
                    message,
                    tree: &tree.sha,
                    parents: [tip.as_str()],
                },
                "commit",
            )
            .await?;

        // Moving the ref is the only step visible to readers of the branch.
        let refs: Vec<&str> = ["git", "refs", "heads"]
            .into_iter()
            .chain(split_path(&self.branch))
            .collect();
        let _: RefResponse = self
            .send_json(
                Method::PATCH,
                self.endpoint(refs)?,
                &UpdateRefRequest {
                    sha: &commit.sha,
                    force: false,
                },
                &self.branch,
            )
            .await?;

        Ok(WriteConfirmation {
            paths: files.keys().cloned().collect(),
            branch: self.branch.clone(),
            base_commit: Some(tip),
            commit_sha: Some(commit.sha),
            content_sha: None,
        })
    }
}

#[async_trait]
impl RepositoryStore for GitHubRepository {
    async fn get(&self, path: &str) -> Result<Option<String>> {
        let path = normalize_path(path)?;
        let Some(meta) = self.file_meta(&path).await? else {
            return Ok(None);
        };
        if meta.encoding.as_deref().is_some_and(|e| e != "base64") {
            return Err(StoreError::decode(
                &path,
                format!(
                    "unsupported encoding {:?}; file may exceed the inline size limit",
                    meta.encoding.unwrap_or_default()
                ),
            ));
        }
        let encoded: String = meta
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| StoreError::decode(&path, e))?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StoreError::decode(&path, e))
    }

    async fn create_or_update(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<WriteConfirmation> {
        let path = normalize_path(path)?;
        let head = self.branch_head().await?;
        let existing = self.file_meta(&path).await?;
        let sha = existing.as_ref().map(|m| m.sha.as_str());
        debug!(path = %path, branch = %self.branch, head = %head, exists = sha.is_some(), "writing file");

        let mut confirmation = self.put_file(&path, content, message, sha).await?;
        confirmation.base_commit = Some(head);
        info!(
            path = %path,
            branch = %self.branch,
            commit = confirmation.commit_sha.as_deref().unwrap_or_default(),
            created = sha.is_none(),
            "file written"
        );
        Ok(confirmation)
    }

    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        sha: Option<&str>,
    ) -> Result<WriteConfirmation> {
        let path = normalize_path(path)?;
        let body = PutContentRequest {
            message,
            content: BASE64.encode(content),
            branch: &self.branch,
            sha,
        };
        let response: ContentWriteResponse = self
            .send_json(Method::PUT, self.contents_url(&path)?, &body, &path)
            .await?;

        Ok(WriteConfirmation {
            paths: vec![path],
            branch: self.branch.clone(),
            base_commit: None,
            commit_sha: Some(response.commit.sha),
            content_sha: response.content.map(|c| c.sha),
        })
    }

    async fn delete(&self, path: &str, message: &str) -> Result<WriteConfirmation> {
        let path = normalize_path(path)?;
        let head = self.branch_head().await?;
        let meta = self
            .file_meta(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })?;

        let body = DeleteContentRequest {
            message,
            sha: &meta.sha,
            branch: &self.branch,
        };
        let response: ContentWriteResponse = self
            .send_json(Method::DELETE, self.contents_url(&path)?, &body, &path)
            .await?;

        info!(path = %path, branch = %self.branch, head = %head, "file deleted");
        Ok(WriteConfirmation {
            paths: vec![path],
            branch: self.branch.clone(),
            base_commit: Some(head),
            commit_sha: Some(response.commit.sha),
            content_sha: None,
        })
    }

    async fn commit_multiple(
        &self,
        files: &BTreeMap<String, Vec<u8>>,
        message: &str,
    ) -> Result<WriteConfirmation> {
        if files.is_empty() {
            return Err(StoreError::invalid_input("no files to commit"));
        }
        let mut normalized = BTreeMap::new();
        for (path, content) in files {
            normalized.insert(normalize_path(path)?, content.clone());
        }
        let paths: Vec<String> = normalized.keys().cloned().collect();

        match self.commit_saga(&normalized, message).await {
            Ok(confirmation) => {
                info!(
                    files = paths.len(),
                    branch = %self.branch,
                    commit = confirmation.commit_sha.as_deref().unwrap_or_default(),
                    "multi-file commit created"
                );
                #[cfg(feature = "metrics")]
                counter!(store_metrics::COMMITS_TOTAL).increment(1);
                Ok(confirmation)
            },
            Err(source) => {
                warn!(files = paths.len(), branch = %self.branch, error = %source, "multi-file commit failed");
                Err(StoreError::MultiCommit {
                    files: paths,
                    source: Box::new(source),
                })
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, serde_json::json};

    const FILE: &str = "/repos/alice/notes/contents/docs/wechat/MyBlog/Post%20One.html";

    fn config(api_base: String) -> RepositoryConfig {
        RepositoryConfig {
            token: Some(Secret::new("t0k".into())),
            owner: "alice".into(),
            name: "notes".into(),
            api_base,
            branch: "master".into(),
            timeout_secs: 5,
        }
    }

    fn repo_for(server: &mockito::ServerGuard) -> GitHubRepository {
        GitHubRepository::new(&config(server.url())).unwrap()
    }

    async fn mock_head(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("GET", "/repos/alice/notes/branches/master")
            .match_header("authorization", "Bearer t0k")
            .match_header("accept", GITHUB_ACCEPT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"name": "master", "commit": {"sha": "head1"}}).to_string())
            .create_async()
            .await
    }

    fn ref_query() -> Matcher {
        Matcher::UrlEncoded("ref".into(), "master".into())
    }

    #[test]
    fn new_requires_token() {
        let mut cfg = config("https://api.github.com".into());
        cfg.token = None;
        assert!(matches!(
            GitHubRepository::new(&cfg),
            Err(StoreError::InvalidInput { .. })
        ));
    }

    #[test]
    fn endpoint_encodes_segments_and_keeps_base_path() {
        let repo =
            GitHubRepository::new(&config("https://ghe.example.com/api/v3/".into())).unwrap();
        let url = repo.contents_url("docs/wechat/My Blog/50% off?.html").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/alice/notes/contents/docs/wechat/My%20Blog/50%25%20off%3F.html"
        );
    }

    #[tokio::test]
    async fn get_decodes_wrapped_base64() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/alice/notes/contents/docs/a.html")
            .match_query(ref_query())
            .with_status(200)
            .with_body(
                json!({"sha": "s1", "encoding": "base64", "content": "PGh0bWw+\naGk8L2h0bWw+\n"})
                    .to_string(),
            )
            .create_async()
            .await;

        let content = repo_for(&server).get("docs/a.html").await.unwrap();
        assert_eq!(content.as_deref(), Some("<html>hi</html>"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/alice/notes/contents/docs/a.html")
            .match_query(ref_query())
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        assert_eq!(repo_for(&server).get("docs/a.html").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_server_error_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/alice/notes/contents/docs/a.html")
            .match_query(ref_query())
            .with_status(500)
            .with_body(r#"{"message":"boom"}"#)
            .create_async()
            .await;

        let err = repo_for(&server).get("docs/a.html").await.unwrap_err();
        assert!(matches!(err, StoreError::Http { status: 500, ref message, .. } if message == "boom"));
    }

    #[tokio::test]
    async fn create_sends_no_sha() {
        let mut server = mockito::Server::new_async().await;
        let head = mock_head(&mut server).await;
        let meta = server
            .mock("GET", FILE)
            .match_query(ref_query())
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", FILE)
            .match_header("authorization", "Bearer t0k")
            .match_body(Matcher::Json(json!({
                "message": "Add docs/wechat/MyBlog/Post One.html",
                "content": "PGh0bWw+aGk8L2h0bWw+",
                "branch": "master",
            })))
            .with_status(201)
            .with_body(json!({"content": {"sha": "blob2"}, "commit": {"sha": "c2"}}).to_string())
            .create_async()
            .await;

        let confirmation = repo_for(&server)
            .create_or_update(
                "docs/wechat/MyBlog/Post One.html",
                b"<html>hi</html>",
                "Add docs/wechat/MyBlog/Post One.html",
            )
            .await
            .unwrap();

        assert_eq!(confirmation.paths, vec!["docs/wechat/MyBlog/Post One.html"]);
        assert_eq!(confirmation.base_commit.as_deref(), Some("head1"));
        assert_eq!(confirmation.commit_sha.as_deref(), Some("c2"));
        assert_eq!(confirmation.content_sha.as_deref(), Some("blob2"));
        head.assert_async().await;
        meta.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn update_sends_existing_sha() {
        let mut server = mockito::Server::new_async().await;
        let _head = mock_head(&mut server).await;
        let _meta = server
            .mock("GET", FILE)
            .match_query(ref_query())
            .with_status(200)
            .with_body(json!({"sha": "old1", "encoding": "base64", "content": ""}).to_string())
            .create_async()
            .await;
        let put = server
            .mock("PUT", FILE)
            .match_body(Matcher::Json(json!({
                "message": "update",
                "content": "PHA+bmV3PC9wPg==",
                "branch": "master",
                "sha": "old1",
            })))
            .with_status(200)
            .with_body(json!({"content": {"sha": "new1"}, "commit": {"sha": "c3"}}).to_string())
            .create_async()
            .await;

        let confirmation = repo_for(&server)
            .create_or_update("docs/wechat/MyBlog/Post One.html", b"<p>new</p>", "update")
            .await
            .unwrap();
        assert_eq!(confirmation.content_sha.as_deref(), Some("new1"));
        put.assert_async().await;
    }

    #[tokio::test]
    async fn stale_sha_is_a_conflict() {
        let mut server = mockito::Server::new_async().await;
        let _put = server
            .mock("PUT", FILE)
            .with_status(409)
            .with_body(r#"{"message":"docs/wechat/MyBlog/Post One.html does not match old1"}"#)
            .create_async()
            .await;

        let err = repo_for(&server)
            .put_file(
                "docs/wechat/MyBlog/Post One.html",
                b"x",
                "update",
                Some("old1"),
            )
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("does not match"));
    }

    #[tokio::test]
    async fn update_raced_by_another_writer_is_a_conflict() {
        let mut server = mockito::Server::new_async().await;
        let _head = mock_head(&mut server).await;
        let _meta = server
            .mock("GET", FILE)
            .match_query(ref_query())
            .with_status(200)
            .with_body(json!({"sha": "old1", "encoding": "base64", "content": ""}).to_string())
            .create_async()
            .await;
        let put = server
            .mock("PUT", FILE)
            .match_body(Matcher::PartialJson(json!({"sha": "old1"})))
            .with_status(409)
            .with_body(r#"{"message":"docs/wechat/MyBlog/Post One.html does not match old1"}"#)
            .create_async()
            .await;

        let err = repo_for(&server)
            .create_or_update("docs/wechat/MyBlog/Post One.html", b"<p>new</p>", "update")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(
            err,
            StoreError::Conflict { ref path, .. } if path.ends_with("Post One.html")
        ));
        put.assert_async().await;
    }

    #[tokio::test]
    async fn missing_sha_422_is_a_conflict() {
        let mut server = mockito::Server::new_async().await;
        let _put = server
            .mock("PUT", FILE)
            .with_status(422)
            .with_body(r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#)
            .create_async()
            .await;

        let err = repo_for(&server)
            .put_file("docs/wechat/MyBlog/Post One.html", b"x", "add", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn other_422_is_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _put = server
            .mock("PUT", FILE)
            .with_status(422)
            .with_body(r#"{"message":"path contains a malformed segment"}"#)
            .create_async()
            .await;

        let err = repo_for(&server)
            .put_file("docs/wechat/MyBlog/Post One.html", b"x", "add", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Http { status: 422, .. }));
    }

    #[tokio::test]
    async fn delete_uses_current_sha_and_branch() {
        let mut server = mockito::Server::new_async().await;
        let _head = mock_head(&mut server).await;
        let _meta = server
            .mock("GET", FILE)
            .match_query(ref_query())
            .with_status(200)
            .with_body(json!({"sha": "s1"}).to_string())
            .create_async()
            .await;
        let del = server
            .mock("DELETE", FILE)
            .match_body(Matcher::Json(json!({
                "message": "remove",
                "sha": "s1",
                "branch": "master",
            })))
            .with_status(200)
            .with_body(json!({"content": null, "commit": {"sha": "c4"}}).to_string())
            .create_async()
            .await;

        let confirmation = repo_for(&server)
            .delete("docs/wechat/MyBlog/Post One.html", "remove")
            .await
            .unwrap();
        assert_eq!(confirmation.branch, "master");
        assert_eq!(confirmation.base_commit.as_deref(), Some("head1"));
        assert_eq!(confirmation.commit_sha.as_deref(), Some("c4"));
        del.assert_async().await;
    }

    #[tokio::test]
    async fn delete_missing_file_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _head = mock_head(&mut server).await;
        let _meta = server
            .mock("GET", FILE)
            .match_query(ref_query())
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;
        let del = server.mock("DELETE", FILE).expect(0).create_async().await;

        let err = repo_for(&server)
            .delete("docs/wechat/MyBlog/Post One.html", "remove")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        del.assert_async().await;
    }

    async fn mock_tip(server: &mut mockito::ServerGuard) -> (mockito::Mock, mockito::Mock) {
        let tip = server
            .mock("GET", "/repos/alice/notes/git/ref/heads/master")
            .with_status(200)
            .with_body(
                json!({"ref": "refs/heads/master", "object": {"sha": "tip", "type": "commit"}})
                    .to_string(),
            )
            .create_async()
            .await;
        let commit = server
            .mock("GET", "/repos/alice/notes/git/commits/tip")
            .with_status(200)
            .with_body(json!({"sha": "tip", "tree": {"sha": "tree0"}}).to_string())
            .create_async()
            .await;
        (tip, commit)
    }

    fn two_files() -> BTreeMap<String, Vec<u8>> {
        BTreeMap::from([
            ("a/one.txt".to_string(), b"one".to_vec()),
            ("b/two.txt".to_string(), b"two".to_vec()),
        ])
    }

    #[tokio::test]
    async fn commit_multiple_moves_ref_once() {
        let mut server = mockito::Server::new_async().await;
        let _tip = mock_tip(&mut server).await;
        let blobs = server
            .mock("POST", "/repos/alice/notes/git/blobs")
            .match_body(Matcher::PartialJson(json!({"encoding": "base64"})))
            .with_status(201)
            .with_body(json!({"sha": "blobX"}).to_string())
            .expect(2)
            .create_async()
            .await;
        let tree = server
            .mock("POST", "/repos/alice/notes/git/trees")
            .match_body(Matcher::Json(json!({
                "base_tree": "tree0",
                "tree": [
                    {"path": "a/one.txt", "mode": "100644", "type": "blob", "sha": "blobX"},
                    {"path": "b/two.txt", "mode": "100644", "type": "blob", "sha": "blobX"},
                ],
            })))
            .with_status(201)
            .with_body(json!({"sha": "tree1"}).to_string())
            .create_async()
            .await;
        let commit = server
            .mock("POST", "/repos/alice/notes/git/commits")
            .match_body(Matcher::Json(json!({
                "message": "batch",
                "tree": "tree1",
                "parents": ["tip"],
            })))
            .with_status(201)
            .with_body(json!({"sha": "new1"}).to_string())
            .expect(1)
            .create_async()
            .await;
        let update = server
            .mock("PATCH", "/repos/alice/notes/git/refs/heads/master")
            .match_body(Matcher::Json(json!({"sha": "new1", "force": false})))
            .with_status(200)
            .with_body(json!({"ref": "refs/heads/master", "object": {"sha": "new1"}}).to_string())
            .expect(1)
            .create_async()
            .await;

        let confirmation = repo_for(&server)
            .commit_multiple(&two_files(), "batch")
            .await
            .unwrap();
        assert_eq!(confirmation.paths, vec!["a/one.txt", "b/two.txt"]);
        assert_eq!(confirmation.base_commit.as_deref(), Some("tip"));
        assert_eq!(confirmation.commit_sha.as_deref(), Some("new1"));
        blobs.assert_async().await;
        tree.assert_async().await;
        commit.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn blob_failure_leaves_ref_untouched() {
        let mut server = mockito::Server::new_async().await;
        let _tip = mock_tip(&mut server).await;
        let _blobs = server
            .mock("POST", "/repos/alice/notes/git/blobs")
            .with_status(500)
            .with_body(r#"{"message":"blob storage unavailable"}"#)
            .create_async()
            .await;
        let tree = server
            .mock("POST", "/repos/alice/notes/git/trees")
            .expect(0)
            .create_async()
            .await;
        let update = server
            .mock("PATCH", "/repos/alice/notes/git/refs/heads/master")
            .expect(0)
            .create_async()
            .await;

        let err = repo_for(&server)
            .commit_multiple(&two_files(), "batch")
            .await
            .unwrap_err();
        match err {
            StoreError::MultiCommit { files, source } => {
                assert_eq!(files, vec!["a/one.txt", "b/two.txt"]);
                assert!(matches!(*source, StoreError::Http { status: 500, .. }));
            },
            other => panic!("unexpected error: {other}"),
        }
        tree.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn empty_commit_is_rejected() {
        let server = mockito::Server::new_async().await;
        let err = repo_for(&server)
            .commit_multiple(&BTreeMap::new(), "nothing")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput { .. }));
    }
}
