use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use lark_github::client::{BranchRef, CreatedComment, GithubApiError, GithubClient};
use lark_github::event_context::RepoRef;
use lark_github::transport::{
    is_retryable_status, parse_retry_after, retry_delay, truncate_for_error,
};

#[derive(Debug, Clone, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GitRefResponse {
    object: GitObject,
}

#[derive(Debug, Clone, Deserialize)]
struct BranchResponse {
    name: String,
    commit: GitObject,
}

/// Reqwest-backed implementation of the GitHub client port with bearer
/// auth, a request timeout, and bounded retries for rate limits and
/// server-side failures.
#[derive(Clone)]
pub struct HttpGithubClient {
    http: reqwest::Client,
    api_base: String,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl HttpGithubClient {
    pub fn new(
        api_base: String,
        token: String,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Lark-mode-dispatch"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            retry_max_attempts: retry_max_attempts.max(1),
            retry_base_delay_ms: retry_base_delay_ms.max(1),
        })
    }

    fn repo_url(&self, repo: &RepoRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{path}",
            self.api_base, repo.owner, repo.name
        )
    }

    async fn execute<F>(
        &self,
        action: &'static str,
        build: F,
    ) -> Result<reqwest::Response, GithubApiError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 1_usize;
        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if is_retryable_status(status) && attempt < self.retry_max_attempts {
                        let retry_after = parse_retry_after(
                            response
                                .headers()
                                .get(reqwest::header::RETRY_AFTER)
                                .and_then(|value| value.to_str().ok()),
                        );
                        let delay =
                            retry_delay(attempt, self.retry_base_delay_ms, retry_after);
                        tracing::debug!(action, status, attempt, "retrying github request");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(error) => {
                    if (error.is_timeout() || error.is_connect())
                        && attempt < self.retry_max_attempts
                    {
                        let delay = retry_delay(attempt, self.retry_base_delay_ms, None);
                        tracing::debug!(action, attempt, "retrying github transport error");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(GithubApiError::Transport(format!("{action}: {error}")));
                }
            }
        }
    }

    async fn expect_json<T: DeserializeOwned>(
        action: &'static str,
        response: reqwest::Response,
    ) -> Result<T, GithubApiError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| GithubApiError::Transport(format!("{action}: {error}")))?;
        if !(200..300).contains(&status) {
            return Err(GithubApiError::Status {
                status,
                body: truncate_for_error(&body),
            });
        }
        serde_json::from_str(&body)
            .map_err(|error| GithubApiError::InvalidResponse(format!("{action}: {error}")))
    }

    async fn expect_success(
        action: &'static str,
        response: reqwest::Response,
    ) -> Result<(), GithubApiError> {
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .map_err(|error| GithubApiError::Transport(format!("{action}: {error}")))?;
        Err(GithubApiError::Status {
            status,
            body: truncate_for_error(&body),
        })
    }
}

#[async_trait]
impl GithubClient for HttpGithubClient {
    async fn branch_head_sha(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<String, GithubApiError> {
        let url = self.repo_url(repo, &format!("git/ref/heads/{branch}"));
        let response = self
            .execute("resolve branch head", || self.http.get(url.clone()))
            .await?;
        let parsed: GitRefResponse = Self::expect_json("resolve branch head", response).await?;
        Ok(parsed.object.sha)
    }

    async fn find_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Option<BranchRef>, GithubApiError> {
        let url = self.repo_url(repo, &format!("branches/{branch}"));
        let response = self
            .execute("look up branch", || self.http.get(url.clone()))
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let parsed: BranchResponse = Self::expect_json("look up branch", response).await?;
        Ok(Some(BranchRef {
            name: parsed.name,
            sha: parsed.commit.sha,
        }))
    }

    async fn create_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
        from_sha: &str,
    ) -> Result<BranchRef, GithubApiError> {
        let url = self.repo_url(repo, "git/refs");
        let payload = json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": from_sha,
        });
        let response = self
            .execute("create branch", || {
                self.http.post(url.clone()).json(&payload)
            })
            .await?;
        let parsed: GitRefResponse = Self::expect_json("create branch", response).await?;
        Ok(BranchRef {
            name: branch.to_string(),
            sha: parsed.object.sha,
        })
    }

    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<CreatedComment, GithubApiError> {
        let url = self.repo_url(repo, &format!("issues/{issue_number}/comments"));
        let payload = json!({ "body": body });
        let response = self
            .execute("create issue comment", || {
                self.http.post(url.clone()).json(&payload)
            })
            .await?;
        Self::expect_json("create issue comment", response).await
    }

    async fn update_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
        body: &str,
    ) -> Result<(), GithubApiError> {
        let url = self.repo_url(repo, &format!("issues/comments/{comment_id}"));
        let payload = json!({ "body": body });
        let response = self
            .execute("update issue comment", || {
                self.http.patch(url.clone()).json(&payload)
            })
            .await?;
        Self::expect_success("update issue comment", response).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use lark_github::client::{GithubApiError, GithubClient};
    use lark_github::event_context::RepoRef;

    use super::HttpGithubClient;

    fn test_repo() -> RepoRef {
        RepoRef {
            owner: "acme".to_string(),
            name: "widget".to_string(),
            default_branch: "main".to_string(),
        }
    }

    fn test_client(base_url: &str) -> HttpGithubClient {
        HttpGithubClient::new(base_url.to_string(), "test-token".to_string(), 3_000, 3, 5)
            .expect("client")
    }

    #[tokio::test]
    async fn integration_create_issue_comment_posts_body_with_auth_headers() {
        let server = MockServer::start();
        let created = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/acme/widget/issues/42/comments")
                .header("authorization", "Bearer test-token")
                .body_includes("Lark is on it");
            then.status(201)
                .json_body(json!({ "id": 777, "html_url": "https://example.test/c/777" }));
        });

        let comment = test_client(&server.base_url())
            .create_issue_comment(&test_repo(), 42, "**Lark is on it.**")
            .await
            .expect("create comment");
        created.assert_calls(1);
        assert_eq!(comment.id, 777);
    }

    #[tokio::test]
    async fn integration_find_branch_maps_404_to_none() {
        let server = MockServer::start();
        let lookup = server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widget/branches/lark/issue-42");
            then.status(404).json_body(json!({ "message": "Not Found" }));
        });

        let found = test_client(&server.base_url())
            .find_branch(&test_repo(), "lark/issue-42")
            .await
            .expect("lookup");
        lookup.assert_calls(1);
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn integration_create_branch_sends_fully_qualified_ref() {
        let server = MockServer::start();
        let created = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/acme/widget/git/refs")
                .body_includes("\"refs/heads/lark/issue-42\"")
                .body_includes("\"abc123\"");
            then.status(201).json_body(json!({
                "ref": "refs/heads/lark/issue-42",
                "object": { "sha": "abc123" },
            }));
        });

        let branch = test_client(&server.base_url())
            .create_branch(&test_repo(), "lark/issue-42", "abc123")
            .await
            .expect("create branch");
        created.assert_calls(1);
        assert_eq!(branch.name, "lark/issue-42");
        assert_eq!(branch.sha, "abc123");
    }

    #[tokio::test]
    async fn integration_update_issue_comment_patches_the_existing_comment() {
        let server = MockServer::start();
        let updated = server.mock(|when, then| {
            when.method(PATCH)
                .path("/repos/acme/widget/issues/comments/777")
                .body_includes("progress update");
            then.status(200).json_body(json!({ "id": 777 }));
        });

        test_client(&server.base_url())
            .update_issue_comment(&test_repo(), 777, "progress update")
            .await
            .expect("update comment");
        updated.assert_calls(1);
    }

    #[tokio::test]
    async fn regression_server_errors_are_retried_up_to_the_attempt_cap() {
        let server = MockServer::start();
        let failing = server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widget/git/ref/heads/main");
            then.status(502).body("bad gateway");
        });

        let error = test_client(&server.base_url())
            .branch_head_sha(&test_repo(), "main")
            .await
            .expect_err("502 stays an error");
        failing.assert_calls(3);
        match error {
            GithubApiError::Status { status, .. } => assert_eq!(status, 502),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn regression_client_errors_are_not_retried() {
        let server = MockServer::start();
        let denied = server.mock(|when, then| {
            when.method(POST).path("/repos/acme/widget/issues/42/comments");
            then.status(403).json_body(json!({ "message": "Forbidden" }));
        });

        let error = test_client(&server.base_url())
            .create_issue_comment(&test_repo(), 42, "body")
            .await
            .expect_err("403 is terminal");
        denied.assert_calls(1);
        match error {
            GithubApiError::Status { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("Forbidden"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
