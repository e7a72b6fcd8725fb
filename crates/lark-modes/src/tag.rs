use async_trait::async_trait;

use lark_github::event_context::{EventContext, GithubEventKind};
use lark_github::mention::body_mentions;

use crate::contract::{Mode, ModeName, ModeOptions, ModeResult, ModeSettings};
use crate::error::PrepareError;
use crate::prepare::EnvironmentPreparer;
use crate::tool_policy::{tag_tool_policy, ToolPolicy};

/// The interactive mode: activates when someone addresses the assistant by
/// mention or assignment, creates a working branch and a tracking comment.
pub struct TagMode {
    trigger_phrase: String,
    assignee_trigger: Option<String>,
}

impl TagMode {
    pub fn new(settings: &ModeSettings) -> Self {
        Self {
            trigger_phrase: settings.trigger_phrase.clone(),
            assignee_trigger: settings
                .assignee_trigger
                .as_ref()
                .map(|login| login.trim_start_matches('@').to_string()),
        }
    }

    fn assignment_matches(&self, context: &EventContext) -> bool {
        let Some(expected) = &self.assignee_trigger else {
            return false;
        };
        context
            .issue
            .as_ref()
            .and_then(|issue| issue.assignee.as_ref())
            .map(|assignee| assignee.login.eq_ignore_ascii_case(expected))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Mode for TagMode {
    fn name(&self) -> ModeName {
        ModeName::Tag
    }

    fn description(&self) -> &'static str {
        "triggered by mentions or assignments directed at the assistant"
    }

    fn should_trigger(&self, context: &EventContext) -> bool {
        match context.kind {
            GithubEventKind::IssueComment
            | GithubEventKind::PullRequestReviewComment
            | GithubEventKind::PullRequestReview => context
                .comment
                .as_ref()
                .map(|comment| body_mentions(&comment.body, &self.trigger_phrase))
                .unwrap_or(false),
            GithubEventKind::IssueOpened => context
                .issue
                .as_ref()
                .map(|issue| {
                    body_mentions(issue.body.as_deref().unwrap_or_default(), &self.trigger_phrase)
                        || body_mentions(&issue.title, &self.trigger_phrase)
                })
                .unwrap_or(false),
            GithubEventKind::IssueAssigned => self.assignment_matches(context),
            GithubEventKind::PullRequestOpened | GithubEventKind::PullRequestSynchronize => {
                context
                    .pull_request
                    .as_ref()
                    .map(|pr| {
                        body_mentions(pr.body.as_deref().unwrap_or_default(), &self.trigger_phrase)
                            || body_mentions(&pr.title, &self.trigger_phrase)
                    })
                    .unwrap_or(false)
            }
            GithubEventKind::WorkflowDispatch | GithubEventKind::Schedule => false,
        }
    }

    fn tool_policy(&self) -> ToolPolicy {
        tag_tool_policy()
    }

    fn creates_tracking_comment(&self) -> bool {
        true
    }

    async fn prepare(&self, options: &ModeOptions) -> Result<ModeResult, PrepareError> {
        EnvironmentPreparer::new(options.github.as_ref())
            .prepare(
                &options.context,
                options.data.as_ref(),
                true,
                self.creates_tracking_comment(),
                &options.github_token,
            )
            .await
    }
}
