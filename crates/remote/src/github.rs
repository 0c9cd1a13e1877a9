//! GitHub contents-API backend for [`RemoteStore`].
//!
//! Version tags are blob SHAs: GitHub rejects a write whose `sha` no longer
//! matches the current blob, which is the optimistic-concurrency guard the
//! rest of the system relies on.

use {
    async_trait::async_trait,
    base64::{Engine, engine::general_purpose::STANDARD},
    futures::future::{BoxFuture, try_join_all},
    reqwest::StatusCode,
    serde::Deserialize,
    serde_json::json,
    skilldock_common::{Error, Result},
    tracing::{debug, info, warn},
};

use crate::{
    store::RemoteStore,
    types::{
        DirEntry, DirectoryDelete, EntryKind, FileContent, TreeFile, UpsertOutcome, is_binary_path,
    },
};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("skilldock/", env!("CARGO_PKG_VERSION"));
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";

/// Client for one GitHub repository (`owner/repo`), authenticated with a
/// service token.
pub struct GitHubStore {
    client: reqwest::Client,
    api_base: String,
    repo: String,
    token: String,
}

impl GitHubStore {
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, repo, token)
    }

    /// Point the client at a different API host (used by tests).
    pub fn with_api_base(
        api_base: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        format!("{}/repos/{}/contents/{}", self.api_base, self.repo, path)
    }

    fn request(&self, method: reqwest::Method, url: &str, accept: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", accept)
            .header("User-Agent", USER_AGENT)
    }

    /// Map a non-success status to the error taxonomy.
    fn status_error(status: StatusCode, path: &str, body: &str) -> Error {
        match status {
            StatusCode::NOT_FOUND => Error::not_found(path.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Error::unauthorized(format!(
                    "remote store rejected request for '{path}' (HTTP {status}); do not retry without backoff"
                ))
            },
            StatusCode::CONFLICT => Error::conflict(format!("version tag mismatch on '{path}'")),
            StatusCode::UNPROCESSABLE_ENTITY if body.contains("does not match") => {
                Error::conflict(format!("version tag mismatch on '{path}'"))
            },
            _ => Error::remote(format!("HTTP {status} for '{path}': {body}")),
        }
    }

    /// GET the contents metadata (JSON) for a path.
    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = self.contents_url(path);
        let resp = self
            .request(reqwest::Method::GET, &url, ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| Error::remote(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::status_error(status, path, &body));
        }
        resp.json()
            .await
            .map_err(|e| Error::remote(format!("decoding contents response for '{path}': {e}")))
    }

    /// PUT a contents write (create when `sha` is None, update otherwise).
    async fn put_contents(
        &self,
        path: &str,
        content: &FileContent,
        message: &str,
        sha: Option<&str>,
    ) -> Result<String> {
        let url = self.contents_url(path);
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content.as_bytes()),
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let resp = self
            .request(reqwest::Method::PUT, &url, ACCEPT_JSON)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::remote(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            // A create (no sha) that hits an existing file comes back 422.
            if sha.is_none() && status == StatusCode::UNPROCESSABLE_ENTITY {
                return Err(Error::conflict(format!("'{path}' already exists")));
            }
            return Err(Self::status_error(status, path, &text));
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::remote(format!("decoding write response for '{path}': {e}")))?;
        let tag = value["content"]["sha"]
            .as_str()
            .ok_or_else(|| Error::remote(format!("write response for '{path}' missing blob sha")))?
            .to_string();
        debug!(path, tag = %tag, "wrote file");
        Ok(tag)
    }
}

/// Shape of a single entry in a contents listing.
#[derive(Deserialize)]
struct RawEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    size: u64,
}

#[async_trait]
impl RemoteStore for GitHubStore {
    async fn read_file(&self, path: &str) -> Result<FileContent> {
        if is_binary_path(path) {
            // Binary-safe channel: JSON metadata carries base64 content.
            let value = self.get_json(path).await?;
            let encoded = value["content"]
                .as_str()
                .ok_or_else(|| Error::remote(format!("no content field for '{path}'")))?
                .replace(['\n', '\r'], "");
            let bytes = STANDARD
                .decode(&encoded)
                .map_err(|e| Error::remote(format!("undecodable content for '{path}': {e}")))?;
            return Ok(FileContent::Binary(bytes));
        }

        let url = self.contents_url(path);
        let resp = self
            .request(reqwest::Method::GET, &url, ACCEPT_RAW)
            .send()
            .await
            .map_err(|e| Error::remote(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::status_error(status, path, &body));
        }
        let text = resp
            .text()
            .await
            .map_err(|e| Error::remote(format!("reading body for '{path}': {e}")))?;
        Ok(FileContent::Text(text))
    }

    async fn version_tag(&self, path: &str) -> Result<String> {
        let value = self.get_json(path).await?;
        value["sha"]
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or_else(|| Error::remote(format!("no sha in contents response for '{path}'")))
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let value = self.get_json(path).await?;
        let raw: Vec<RawEntry> = serde_json::from_value(value)
            .map_err(|_| Error::invalid(format!("'{path}' is not a directory")))?;

        Ok(raw
            .into_iter()
            .map(|e| DirEntry {
                kind: if e.kind == "dir" {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                },
                name: e.name,
                path: e.path,
                tag: e.sha,
                size: e.size,
            })
            .collect())
    }

    async fn read_directory_recursive(&self, path: &str) -> Result<Vec<TreeFile>> {
        let root = path.trim_matches('/').to_string();
        let files = collect_tree(self, root.clone(), root.clone()).await?;
        debug!(path = %root, count = files.len(), "recursive read complete");
        Ok(files)
    }

    async fn create_file(
        &self,
        path: &str,
        content: &FileContent,
        message: &str,
    ) -> Result<String> {
        let tag = self.put_contents(path, content, message, None).await?;
        info!(path, "created file");
        Ok(tag)
    }

    async fn update_file(
        &self,
        path: &str,
        content: &FileContent,
        message: &str,
        expected_tag: &str,
    ) -> Result<String> {
        let tag = self
            .put_contents(path, content, message, Some(expected_tag))
            .await?;
        info!(path, "updated file");
        Ok(tag)
    }

    async fn upsert_file(
        &self,
        path: &str,
        content: &FileContent,
        message: &str,
    ) -> Result<UpsertOutcome> {
        // Tag read immediately before the write: the optimistic-concurrency
        // window is the gap between these two calls.
        let existing = match self.version_tag(path).await {
            Ok(tag) => Some(tag),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        let created = existing.is_none();
        let tag = self
            .put_contents(path, content, message, existing.as_deref())
            .await?;
        Ok(UpsertOutcome { tag, created })
    }

    async fn delete_file(&self, path: &str, message: &str, expected_tag: &str) -> Result<()> {
        let url = self.contents_url(path);
        let body = json!({ "message": message, "sha": expected_tag });
        let resp = self
            .request(reqwest::Method::DELETE, &url, ACCEPT_JSON)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::remote(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::status_error(status, path, &text));
        }
        info!(path, "deleted file");
        Ok(())
    }

    async fn delete_directory(&self, path: &str, message: &str) -> Result<DirectoryDelete> {
        let leaves = collect_leaf_files(self, path.to_string()).await?;
        let mut report = DirectoryDelete::default();

        // No atomic directory delete upstream; remove leaves one by one and
        // report whatever fails. Already-deleted files stay deleted.
        for (leaf, tag) in leaves {
            match self.delete_file(&leaf, message, &tag).await {
                Ok(()) => report.deleted.push(leaf),
                Err(e) => {
                    warn!(path = %leaf, error = %e, "leaf delete failed");
                    report.failed.push((leaf, e.to_string()));
                },
            }
        }

        info!(
            path,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "directory delete finished"
        );
        Ok(report)
    }
}

/// Recursively collect files under `dir` into a flat list with paths relative
/// to `root`. Sibling files and subtrees are fetched concurrently; the
/// overall ordering is whatever the joins produce.
fn collect_tree(
    store: &GitHubStore,
    root: String,
    dir: String,
) -> BoxFuture<'_, Result<Vec<TreeFile>>> {
    Box::pin(async move {
        let entries = store.list_directory(&dir).await?;

        let (dirs, files): (Vec<_>, Vec<_>) = entries.into_iter().partition(DirEntry::is_dir);

        let file_futures = files.into_iter().map(|entry| {
            let root = root.clone();
            async move {
                let content = store.read_file(&entry.path).await?;
                let relative = entry
                    .path
                    .strip_prefix(&format!("{root}/"))
                    .unwrap_or(&entry.path)
                    .to_string();
                Ok::<_, Error>(TreeFile {
                    path: relative,
                    content,
                })
            }
        });
        let dir_futures = dirs
            .into_iter()
            .map(|entry| collect_tree(store, root.clone(), entry.path));

        let (mut collected, subtrees) = futures::try_join!(
            try_join_all(file_futures),
            try_join_all(dir_futures)
        )?;
        for subtree in subtrees {
            collected.extend(subtree);
        }
        Ok(collected)
    })
}

/// Collect `(path, tag)` for every file under `dir`, recursively.
fn collect_leaf_files(
    store: &GitHubStore,
    dir: String,
) -> BoxFuture<'_, Result<Vec<(String, String)>>> {
    Box::pin(async move {
        let entries = store.list_directory(&dir).await?;
        let mut leaves = Vec::new();
        for entry in entries {
            if entry.is_dir() {
                leaves.extend(collect_leaf_files(store, entry.path).await?);
            } else {
                let tag = match entry.tag {
                    Some(tag) => tag,
                    None => store.version_tag(&entry.path).await?,
                };
                leaves.push((entry.path, tag));
            }
        }
        Ok(leaves)
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn store_for(server: &mockito::Server) -> GitHubStore {
        GitHubStore::with_api_base(server.url(), "acme/marketplace", "test-token")
    }

    #[tokio::test]
    async fn read_text_file_uses_raw_channel() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/marketplace/contents/packages/demo/package.json")
            .match_header("accept", ACCEPT_RAW)
            .with_status(200)
            .with_body(r#"{"name":"demo"}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let content = store.read_file("packages/demo/package.json").await.unwrap();
        assert_eq!(content.as_text(), Some(r#"{"name":"demo"}"#));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn read_binary_file_decodes_base64() {
        let mut server = mockito::Server::new_async().await;
        let payload = STANDARD.encode([0_u8, 159, 146, 150]);
        let _mock = server
            .mock("GET", "/repos/acme/marketplace/contents/assets/logo.png")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "name": "logo.png",
                    "sha": "abc",
                    "encoding": "base64",
                    "content": format!("{}\n", payload),
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = store_for(&server);
        let content = store.read_file("assets/logo.png").await.unwrap();
        assert_eq!(content.as_bytes(), &[0, 159, 146, 150]);
        assert!(content.is_binary());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/marketplace/contents/nope.md")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let err = store.read_file("nope.md").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn rate_limit_maps_to_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/marketplace/contents/x.md")
            .with_status(403)
            .with_body(r#"{"message":"API rate limit exceeded"}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let err = store.read_file("x.md").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn stale_tag_update_is_conflict() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/repos/acme/marketplace/contents/a.md")
            .with_status(409)
            .with_body(r#"{"message":"a.md does not match"}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let err = store
            .update_file("a.md", &"new".into(), "update a", "stale-sha")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn upsert_creates_when_absent() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/repos/acme/marketplace/contents/new.md")
            .with_status(404)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/acme/marketplace/contents/new.md")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "message": "add new.md",
            })))
            .with_status(201)
            .with_body(r#"{"content":{"sha":"newsha"}}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let outcome = store
            .upsert_file("new.md", &"hi".into(), "add new.md")
            .await
            .unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.tag, "newsha");
        put.assert_async().await;
    }

    #[tokio::test]
    async fn upsert_updates_with_current_tag() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/repos/acme/marketplace/contents/old.md")
            .with_status(200)
            .with_body(r#"{"sha":"oldsha","type":"file"}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/acme/marketplace/contents/old.md")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "sha": "oldsha",
            })))
            .with_status(200)
            .with_body(r#"{"content":{"sha":"nextsha"}}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let outcome = store
            .upsert_file("old.md", &"hi".into(), "edit old.md")
            .await
            .unwrap();
        assert!(!outcome.created);
        assert_eq!(outcome.tag, "nextsha");
        put.assert_async().await;
    }

    #[tokio::test]
    async fn recursive_read_flattens_relative_paths() {
        let mut server = mockito::Server::new_async().await;
        let _root = server
            .mock("GET", "/repos/acme/marketplace/contents/pkg/skills/demo")
            .match_header("accept", ACCEPT_JSON)
            .with_status(200)
            .with_body(
                serde_json::json!([
                    {"name": "SKILL.md", "path": "pkg/skills/demo/SKILL.md", "type": "file", "sha": "s1", "size": 10},
                    {"name": "scripts", "path": "pkg/skills/demo/scripts", "type": "dir", "sha": "s2", "size": 0},
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let _sub = server
            .mock("GET", "/repos/acme/marketplace/contents/pkg/skills/demo/scripts")
            .match_header("accept", ACCEPT_JSON)
            .with_status(200)
            .with_body(
                serde_json::json!([
                    {"name": "run.py", "path": "pkg/skills/demo/scripts/run.py", "type": "file", "sha": "s3", "size": 5},
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let _skill = server
            .mock("GET", "/repos/acme/marketplace/contents/pkg/skills/demo/SKILL.md")
            .match_header("accept", ACCEPT_RAW)
            .with_status(200)
            .with_body("---\nname: demo\n---\nbody")
            .create_async()
            .await;
        let _script = server
            .mock("GET", "/repos/acme/marketplace/contents/pkg/skills/demo/scripts/run.py")
            .match_header("accept", ACCEPT_RAW)
            .with_status(200)
            .with_body("print('hi')")
            .create_async()
            .await;

        let store = store_for(&server);
        let mut files = store
            .read_directory_recursive("pkg/skills/demo")
            .await
            .unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "SKILL.md");
        assert_eq!(files[1].path, "scripts/run.py");
    }

    #[tokio::test]
    async fn delete_directory_reports_partial_failure() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/repos/acme/marketplace/contents/pkg/doomed")
            .with_status(200)
            .with_body(
                serde_json::json!([
                    {"name": "a.md", "path": "pkg/doomed/a.md", "type": "file", "sha": "sa", "size": 1},
                    {"name": "b.md", "path": "pkg/doomed/b.md", "type": "file", "sha": "sb", "size": 1},
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let _del_a = server
            .mock("DELETE", "/repos/acme/marketplace/contents/pkg/doomed/a.md")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _del_b = server
            .mock("DELETE", "/repos/acme/marketplace/contents/pkg/doomed/b.md")
            .with_status(409)
            .with_body(r#"{"message":"b.md does not match"}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let report = store
            .delete_directory("pkg/doomed", "remove doomed")
            .await
            .unwrap();
        assert_eq!(report.deleted, vec!["pkg/doomed/a.md"]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
    }
}
