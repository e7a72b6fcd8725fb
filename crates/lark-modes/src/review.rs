use async_trait::async_trait;

use lark_github::event_context::{EventContext, GithubEventKind};

use crate::contract::{FetchedData, Mode, ModeContext, ModeName, ModeOptions, ModeResult};
use crate::error::PrepareError;
use crate::prepare::EnvironmentPreparer;
use crate::tool_policy::{review_tool_policy, ToolPolicy};

/// The read-only mode: reacts to pull-request lifecycle events regardless of
/// mention content, never creates a branch, and supplies its own review
/// prompt.
pub struct ReviewMode;

#[async_trait]
impl Mode for ReviewMode {
    fn name(&self) -> ModeName {
        ModeName::Review
    }

    fn description(&self) -> &'static str {
        "reviews pull requests on open and synchronize events"
    }

    fn should_trigger(&self, context: &EventContext) -> bool {
        matches!(
            context.kind,
            GithubEventKind::PullRequestOpened | GithubEventKind::PullRequestSynchronize
        )
    }

    fn tool_policy(&self) -> ToolPolicy {
        review_tool_policy()
    }

    fn creates_tracking_comment(&self) -> bool {
        true
    }

    fn generate_prompt(&self, prepared: &ModeContext, fetched: &FetchedData) -> Option<String> {
        let pr = prepared.event.pull_request.as_ref()?;
        let mut prompt = format!(
            "Review pull request #{} ({}) in {}.\nBase branch: {}. Head branch: {}.",
            pr.number,
            pr.title,
            prepared.event.repo.slug(),
            pr.base_branch,
            pr.head_branch,
        );
        if let Some(body) = fetched.body.as_deref().filter(|body| !body.trim().is_empty()) {
            prompt.push_str(&format!("\n\nAuthor's description:\n{body}"));
        }
        prompt.push_str(
            "\n\nInspect the changed files and submit a review covering correctness, \
             clarity, and test coverage. Do not modify any files.",
        );
        Some(prompt)
    }

    async fn prepare(&self, options: &ModeOptions) -> Result<ModeResult, PrepareError> {
        EnvironmentPreparer::new(options.github.as_ref())
            .prepare(
                &options.context,
                options.data.as_ref(),
                false,
                self.creates_tracking_comment(),
                &options.github_token,
            )
            .await
    }
}
