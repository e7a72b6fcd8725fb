use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::event_context::RepoRef;

#[derive(Debug, Error)]
/// Errors surfaced by the GitHub client port.
pub enum GithubApiError {
    #[error("github returned non-success status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// A branch name plus the commit it currently points at.
pub struct BranchRef {
    pub name: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedComment {
    pub id: u64,
    pub html_url: Option<String>,
}

/// Capability port over the GitHub API: branch lookup/creation and issue
/// comment creation/update. The mode core depends only on this trait; the
/// reqwest-backed implementation lives in the runtime crate.
#[async_trait]
pub trait GithubClient: Send + Sync {
    /// Commit SHA a branch currently points at. Fails when the branch does
    /// not exist.
    async fn branch_head_sha(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<String, GithubApiError>;

    /// Look up a branch, mapping "not found" to `None`.
    async fn find_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Option<BranchRef>, GithubApiError>;

    /// Create a branch pointing at `from_sha`.
    async fn create_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
        from_sha: &str,
    ) -> Result<BranchRef, GithubApiError>;

    /// Post a comment on an issue or pull request discussion thread.
    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<CreatedComment, GithubApiError>;

    /// Replace the body of an existing issue/PR comment.
    async fn update_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
        body: &str,
    ) -> Result<(), GithubApiError>;
}
