use std::sync::Arc;

use serde::Serialize;

use lark_github::client::GithubClient;
use lark_github::event_context::EventContext;
use lark_modes::{
    mode_for, FetchedData, ModeContext, ModeData, ModeName, ModeOptions, ModeResult,
    ModeSettings, PrepareError,
};

use crate::prompt::default_prompt;

/// Inputs for one pipeline run against a single triggering event.
pub struct RunRequest {
    pub mode: ModeName,
    pub settings: ModeSettings,
    pub event: EventContext,
    pub github: Arc<dyn GithubClient>,
    pub github_token: String,
    pub data: Option<ModeData>,
}

/// Everything downstream invocation needs: the prepared context, the
/// preparation result, and the final prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPreparation {
    pub context: ModeContext,
    pub result: ModeResult,
    pub prompt: String,
}

/// Drive one event through the mode pipeline. Returns `Ok(None)` when the
/// trigger is negative; the short-circuit happens before any GitHub call,
/// so a non-triggering event leaves no trace. Only preparation failure
/// aborts the run.
pub async fn prepare_run(request: RunRequest) -> Result<Option<RunPreparation>, PrepareError> {
    let mode = mode_for(request.mode, &request.settings);
    if !mode.should_trigger(&request.event) {
        tracing::info!(
            mode = %request.mode,
            event = request.event.kind.as_str(),
            "trigger negative, halting with no side effects"
        );
        return Ok(None);
    }

    tracing::info!(
        mode = %request.mode,
        key = %request.event.event_key(),
        "trigger positive, preparing environment"
    );
    let options = ModeOptions {
        context: request.event.clone(),
        github: Arc::clone(&request.github),
        github_token: request.github_token.clone(),
        data: request.data.clone(),
    };
    let result = mode.prepare(&options).await?;

    let resolved = ModeData {
        comment_id: result.comment_id,
        base_branch: Some(result.branch_info.base_branch.clone()),
        work_branch: result.branch_info.work_branch.clone(),
    };
    let prepared = mode.prepare_context(&request.event, Some(&resolved));
    let fetched = FetchedData::from_event(&request.event);
    let prompt = mode
        .generate_prompt(&prepared, &fetched)
        .unwrap_or_else(|| default_prompt(&prepared, &fetched));

    Ok(Some(RunPreparation {
        context: prepared,
        result,
        prompt,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use lark_github::client::{BranchRef, CreatedComment, GithubApiError, GithubClient};
    use lark_github::event_context::{EventContext, RepoRef};
    use lark_modes::{ModeData, ModeName, ModeSettings};

    use super::{prepare_run, RunRequest};

    /// Counts every port call so tests can assert the no-side-effect
    /// guarantee.
    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    impl CountingClient {
        fn total(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GithubClient for CountingClient {
        async fn branch_head_sha(
            &self,
            _repo: &RepoRef,
            _branch: &str,
        ) -> Result<String, GithubApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("abc123".to_string())
        }

        async fn find_branch(
            &self,
            _repo: &RepoRef,
            _branch: &str,
        ) -> Result<Option<BranchRef>, GithubApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn create_branch(
            &self,
            _repo: &RepoRef,
            branch: &str,
            from_sha: &str,
        ) -> Result<BranchRef, GithubApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BranchRef {
                name: branch.to_string(),
                sha: from_sha.to_string(),
            })
        }

        async fn create_issue_comment(
            &self,
            _repo: &RepoRef,
            _issue_number: u64,
            _body: &str,
        ) -> Result<CreatedComment, GithubApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CreatedComment {
                id: 777,
                html_url: None,
            })
        }

        async fn update_issue_comment(
            &self,
            _repo: &RepoRef,
            _comment_id: u64,
            _body: &str,
        ) -> Result<(), GithubApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn issue_comment_event(body: &str) -> EventContext {
        let payload = json!({
            "action": "created",
            "issue": { "number": 42, "title": "Crash", "body": "boom" },
            "comment": { "id": 9001, "body": body },
            "repository": {
                "name": "widget",
                "owner": { "login": "acme" },
                "default_branch": "main",
            },
            "sender": { "login": "octocat" },
        });
        EventContext::from_webhook("issue_comment", payload).expect("parse")
    }

    fn pull_request_event() -> EventContext {
        let payload = json!({
            "action": "opened",
            "pull_request": {
                "number": 17,
                "title": "Refactor session cache",
                "body": "Replaces the ad-hoc map with an LRU.",
                "state": "open",
                "base": { "ref": "main" },
                "head": { "ref": "feature/session-cache" },
            },
            "repository": {
                "name": "widget",
                "owner": { "login": "acme" },
                "default_branch": "main",
            },
            "sender": { "login": "octocat" },
        });
        EventContext::from_webhook("pull_request", payload).expect("parse")
    }

    fn request(
        mode: ModeName,
        event: EventContext,
        github: Arc<CountingClient>,
        data: Option<ModeData>,
    ) -> RunRequest {
        RunRequest {
            mode,
            settings: ModeSettings::default(),
            event,
            github,
            github_token: "token".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn functional_negative_trigger_halts_before_any_github_call() {
        let client = Arc::new(CountingClient::default());
        let outcome = prepare_run(request(
            ModeName::Tag,
            issue_comment_event("nothing relevant here"),
            Arc::clone(&client),
            None,
        ))
        .await
        .expect("pipeline");
        assert!(outcome.is_none());
        assert_eq!(client.total(), 0);
    }

    #[tokio::test]
    async fn integration_tag_run_resolves_branch_comment_and_default_prompt() {
        let client = Arc::new(CountingClient::default());
        let prepared = prepare_run(request(
            ModeName::Tag,
            issue_comment_event("@lark please fix the bug"),
            Arc::clone(&client),
            None,
        ))
        .await
        .expect("pipeline")
        .expect("triggered");

        assert_eq!(prepared.result.branch_info.base_branch, "main");
        assert_eq!(
            prepared.result.branch_info.work_branch.as_deref(),
            Some("lark/issue-42")
        );
        assert_eq!(prepared.result.comment_id, Some(777));
        assert_eq!(prepared.context.comment_id, Some(777));
        assert_eq!(prepared.context.work_branch.as_deref(), Some("lark/issue-42"));
        assert!(prepared.prompt.contains("acme/widget"));
        assert!(prepared.prompt.contains("@lark please fix the bug"));
        assert!(!prepared.result.mcp_config.is_empty());
    }

    #[tokio::test]
    async fn integration_resumed_run_reuses_the_supplied_comment_id() {
        let client = Arc::new(CountingClient::default());
        let data = ModeData {
            comment_id: Some(42),
            ..ModeData::default()
        };
        let prepared = prepare_run(request(
            ModeName::Tag,
            issue_comment_event("@lark continue"),
            Arc::clone(&client),
            Some(data),
        ))
        .await
        .expect("pipeline")
        .expect("triggered");

        assert_eq!(prepared.result.comment_id, Some(42));
        // branch lookup + head sha + create branch, but no comment call
        assert_eq!(client.total(), 3);
    }

    #[tokio::test]
    async fn integration_review_run_uses_prompt_override_and_no_work_branch() {
        let client = Arc::new(CountingClient::default());
        let prepared = prepare_run(request(
            ModeName::Review,
            pull_request_event(),
            Arc::clone(&client),
            None,
        ))
        .await
        .expect("pipeline")
        .expect("triggered");

        assert_eq!(prepared.result.branch_info.work_branch, None);
        assert_eq!(
            prepared.result.branch_info.current_branch,
            "feature/session-cache"
        );
        assert!(prepared.prompt.contains("Review pull request #17"));
        // only the tracking comment call, no branch mutation
        assert_eq!(client.total(), 1);
    }

    #[tokio::test]
    async fn regression_agent_run_skips_comment_and_reuses_open_pr_head() {
        let client = Arc::new(CountingClient::default());
        let prepared = prepare_run(request(
            ModeName::Agent,
            pull_request_event(),
            Arc::clone(&client),
            None,
        ))
        .await
        .expect("pipeline")
        .expect("triggered");

        assert_eq!(prepared.result.comment_id, None);
        assert_eq!(prepared.result.branch_info.work_branch, None);
        assert_eq!(
            prepared.result.branch_info.current_branch,
            "feature/session-cache"
        );
        assert_eq!(client.total(), 0);
    }
}
