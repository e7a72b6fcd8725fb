use serde_json::json;

use lark_github::branch::work_branch_for_event;
use lark_github::client::GithubClient;
use lark_github::comment::render_tracking_comment;
use lark_github::event_context::{EventContext, RepoRef};

use crate::contract::{BranchInfo, ModeData, ModeResult};
use crate::error::PrepareError;

/// Drives one run through branch resolution, then comment resolution, then
/// result assembly. The ordering is load-bearing: the tracking comment body
/// references the resolved branch. Failure at any step is terminal for the
/// run; the caller decides whether to retry the whole run.
///
/// Both resolutions reuse existing identifiers (a branch with the
/// deterministic name, a caller-supplied comment id) before creating
/// anything, so re-invoking `prepare` for the same event never duplicates
/// side effects.
pub struct EnvironmentPreparer<'a> {
    github: &'a dyn GithubClient,
}

impl<'a> EnvironmentPreparer<'a> {
    pub fn new(github: &'a dyn GithubClient) -> Self {
        Self { github }
    }

    pub async fn prepare(
        &self,
        context: &EventContext,
        data: Option<&ModeData>,
        needs_work_branch: bool,
        wants_tracking_comment: bool,
        github_token: &str,
    ) -> Result<ModeResult, PrepareError> {
        let branch_info = self
            .resolve_branch(context, data, needs_work_branch)
            .await?;
        tracing::debug!(
            base = %branch_info.base_branch,
            current = %branch_info.current_branch,
            "branch environment resolved"
        );
        let comment_id = self
            .resolve_comment(context, data, wants_tracking_comment, &branch_info)
            .await?;
        let mcp_config =
            render_mcp_config(&context.repo, &branch_info, github_token, comment_id);
        Ok(ModeResult {
            comment_id,
            branch_info,
            mcp_config,
        })
    }

    async fn resolve_branch(
        &self,
        context: &EventContext,
        data: Option<&ModeData>,
        needs_work_branch: bool,
    ) -> Result<BranchInfo, PrepareError> {
        let base_branch = data
            .and_then(|d| d.base_branch.clone())
            .unwrap_or_else(|| context.base_branch().to_string());

        if !needs_work_branch {
            let current_branch = context
                .pull_request
                .as_ref()
                .map(|pr| pr.head_branch.clone())
                .unwrap_or_else(|| base_branch.clone());
            return Ok(BranchInfo {
                base_branch,
                current_branch,
                work_branch: None,
            });
        }

        // An open PR already has a mutable branch; push there instead of
        // creating a second one.
        if let Some(pr) = &context.pull_request {
            if pr.is_open() {
                return Ok(BranchInfo {
                    base_branch,
                    current_branch: pr.head_branch.clone(),
                    work_branch: None,
                });
            }
        }

        let name = data
            .and_then(|d| d.work_branch.clone())
            .unwrap_or_else(|| work_branch_for_event(context));
        let existing = self
            .github
            .find_branch(&context.repo, &name)
            .await
            .map_err(|source| PrepareError::BranchLookup {
                branch: name.clone(),
                source,
            })?;
        if let Some(branch) = existing {
            tracing::debug!(branch = %branch.name, "reusing existing working branch");
            return Ok(BranchInfo {
                base_branch,
                current_branch: branch.name.clone(),
                work_branch: Some(branch.name),
            });
        }

        let base_sha = self
            .github
            .branch_head_sha(&context.repo, &base_branch)
            .await
            .map_err(|source| PrepareError::BaseBranchLookup {
                branch: base_branch.clone(),
                source,
            })?;
        let created = self
            .github
            .create_branch(&context.repo, &name, &base_sha)
            .await
            .map_err(|source| PrepareError::BranchCreate {
                branch: name.clone(),
                source,
            })?;
        tracing::debug!(branch = %created.name, %base_sha, "created working branch");
        Ok(BranchInfo {
            base_branch,
            current_branch: created.name.clone(),
            work_branch: Some(created.name),
        })
    }

    async fn resolve_comment(
        &self,
        context: &EventContext,
        data: Option<&ModeData>,
        wants_tracking_comment: bool,
        branch_info: &BranchInfo,
    ) -> Result<Option<u64>, PrepareError> {
        if !wants_tracking_comment {
            return Ok(None);
        }
        if let Some(id) = data.and_then(|d| d.comment_id) {
            tracing::debug!(comment_id = id, "reusing tracking comment");
            return Ok(Some(id));
        }
        let issue_number = context
            .entity_number()
            .ok_or(PrepareError::MissingCommentSurface)?;
        let body = render_tracking_comment(
            &context.event_key(),
            branch_info.work_branch.as_deref(),
        );
        let created = self
            .github
            .create_issue_comment(&context.repo, issue_number, &body)
            .await
            .map_err(PrepareError::CommentCreate)?;
        tracing::debug!(comment_id = created.id, "created tracking comment");
        Ok(Some(created.id))
    }
}

/// Serialized MCP server table consumed verbatim by the downstream agent
/// runtime. The `github_comment` server only exists when a tracking comment
/// does.
fn render_mcp_config(
    repo: &RepoRef,
    branch_info: &BranchInfo,
    github_token: &str,
    comment_id: Option<u64>,
) -> String {
    let mut servers = serde_json::Map::new();
    servers.insert(
        "github".to_string(),
        json!({
            "command": "lark-mcp-github",
            "args": ["stdio"],
            "env": {
                "GITHUB_TOKEN": github_token,
                "REPO_OWNER": repo.owner,
                "REPO_NAME": repo.name,
                "BRANCH": branch_info.current_branch,
            },
        }),
    );
    if let Some(id) = comment_id {
        servers.insert(
            "github_comment".to_string(),
            json!({
                "command": "lark-mcp-github",
                "args": ["stdio", "--comment-server"],
                "env": {
                    "GITHUB_TOKEN": github_token,
                    "REPO_OWNER": repo.owner,
                    "REPO_NAME": repo.name,
                    "COMMENT_ID": id.to_string(),
                },
            }),
        );
    }
    json!({ "mcpServers": servers }).to_string()
}
