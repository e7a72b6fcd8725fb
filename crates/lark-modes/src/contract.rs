use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lark_github::client::GithubClient;
use lark_github::event_context::EventContext;

use crate::error::{PrepareError, UnknownModeError};
use crate::tool_policy::ToolPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Closed set of execution modes, selected once per run by configuration.
pub enum ModeName {
    Tag,
    Agent,
    Review,
}

impl ModeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Agent => "agent",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeName {
    type Err = UnknownModeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tag" => Ok(Self::Tag),
            "agent" => Ok(Self::Agent),
            "review" => Ok(Self::Review),
            _ => Err(UnknownModeError(raw.to_string())),
        }
    }
}

/// Configuration shared by mode constructors. Static for the duration of a
/// run; trigger evaluation may depend on it but never on the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeSettings {
    /// Handle whose mention activates the assistant, e.g. `@lark`.
    pub trigger_phrase: String,
    /// Login whose issue assignment activates the assistant, if any.
    pub assignee_trigger: Option<String>,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            trigger_phrase: "@lark".to_string(),
            assignee_trigger: None,
        }
    }
}

/// Caller-supplied overrides seeding resolution, e.g. when resuming a prior
/// run. Absent fields mean "resolve fresh."
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeData {
    pub comment_id: Option<u64>,
    pub base_branch: Option<String>,
    pub work_branch: Option<String>,
}

/// Context handed to prompt generation: the selected mode, the triggering
/// event, and whatever identifiers preparation resolved. Built once per run
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeContext {
    pub mode: ModeName,
    pub event: EventContext,
    pub comment_id: Option<u64>,
    pub base_branch: Option<String>,
    pub work_branch: Option<String>,
}

/// Resolved branch environment. `base_branch` and `current_branch` are
/// always present for a triggered run; `work_branch` only when a dedicated
/// mutable branch was created for the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub base_branch: String,
    pub current_branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_branch: Option<String>,
}

/// Output contract of environment preparation. `mcp_config` is an opaque
/// serialized configuration handed verbatim to the downstream agent runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeResult {
    pub comment_id: Option<u64>,
    pub branch_info: BranchInfo,
    pub mcp_config: String,
}

/// Inputs to [`Mode::prepare`], the only side-effecting operation.
pub struct ModeOptions {
    pub context: EventContext,
    pub github: Arc<dyn GithubClient>,
    pub github_token: String,
    pub data: Option<ModeData>,
}

/// Read-only digest of the event handed to the optional prompt override
/// alongside the prepared context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedData {
    pub title: Option<String>,
    pub body: Option<String>,
    pub trigger_comment: Option<String>,
}

impl FetchedData {
    pub fn from_event(context: &EventContext) -> Self {
        let (title, body) = match (&context.pull_request, &context.issue) {
            (Some(pr), _) => (Some(pr.title.clone()), pr.body.clone()),
            (None, Some(issue)) => (Some(issue.title.clone()), issue.body.clone()),
            (None, None) => (None, None),
        };
        Self {
            title,
            body,
            trigger_comment: context.comment.as_ref().map(|c| c.body.clone()),
        }
    }
}

/// Pure merge of event context and caller-supplied data into a
/// [`ModeContext`]. Data fields, when present, win over values derivable
/// from the context. Never fails.
pub fn merge_context(
    mode: ModeName,
    context: &EventContext,
    data: Option<&ModeData>,
) -> ModeContext {
    ModeContext {
        mode,
        comment_id: data.and_then(|d| d.comment_id),
        base_branch: data
            .and_then(|d| d.base_branch.clone())
            .or_else(|| Some(context.base_branch().to_string())),
        work_branch: data.and_then(|d| d.work_branch.clone()),
        event: context.clone(),
    }
}

/// Uniform mode contract. The caller never branches on mode identity: it
/// asks the selected mode whether to trigger, what tools to grant, whether
/// to track progress in a comment, and to prepare the environment.
///
/// `prepare` is the only operation permitted side effects and must be
/// idempotent: re-invocation with options referencing an already-resolved
/// branch or comment reuses the existing identifiers.
#[async_trait]
pub trait Mode: Send + Sync {
    fn name(&self) -> ModeName;

    fn description(&self) -> &'static str;

    /// Pure, deterministic trigger predicate.
    fn should_trigger(&self, context: &EventContext) -> bool;

    /// Pure merge of context and overrides; performs no I/O.
    fn prepare_context(
        &self,
        context: &EventContext,
        data: Option<&ModeData>,
    ) -> ModeContext {
        merge_context(self.name(), context, data)
    }

    /// Static allow/deny capability sets for this mode.
    fn tool_policy(&self) -> ToolPolicy;

    fn allowed_tools(&self) -> Vec<String> {
        self.tool_policy().allowed()
    }

    fn disallowed_tools(&self) -> Vec<String> {
        self.tool_policy().disallowed()
    }

    fn creates_tracking_comment(&self) -> bool;

    /// Mode-specific prompt override. `None` means "use the default prompt
    /// builder"; absence is the only non-default signal.
    fn generate_prompt(&self, prepared: &ModeContext, fetched: &FetchedData) -> Option<String> {
        let _ = (prepared, fetched);
        None
    }

    /// Resolve the branch/comment environment, talking to the GitHub client
    /// port. May suspend on network I/O.
    async fn prepare(&self, options: &ModeOptions) -> Result<ModeResult, PrepareError>;
}

#[cfg(test)]
mod tests {
    use super::{merge_context, FetchedData, ModeData, ModeName};
    use lark_github::event_context::EventContext;
    use serde_json::json;
    use std::str::FromStr;

    fn sample_context() -> EventContext {
        let payload = json!({
            "action": "created",
            "issue": { "number": 7, "title": "Flaky test", "body": "It fails on CI." },
            "comment": { "id": 55, "body": "@lark take a look" },
            "repository": {
                "name": "widget",
                "owner": { "login": "acme" },
                "default_branch": "main",
            },
            "sender": { "login": "octocat" },
        });
        EventContext::from_webhook("issue_comment", payload).expect("parse")
    }

    #[test]
    fn unit_mode_name_round_trips_through_strings() {
        for (raw, expected) in [
            ("tag", ModeName::Tag),
            ("agent", ModeName::Agent),
            ("REVIEW", ModeName::Review),
        ] {
            assert_eq!(ModeName::from_str(raw).expect("parse"), expected);
        }
        assert_eq!(ModeName::Tag.to_string(), "tag");
        let error = ModeName::from_str("batch").expect_err("unknown mode");
        assert!(error.to_string().contains("batch"));
    }

    #[test]
    fn functional_merge_context_lets_data_win_over_derived_values() {
        let context = sample_context();
        let data = ModeData {
            comment_id: Some(42),
            base_branch: Some("release/1.2".to_string()),
            work_branch: Some("lark/issue-7".to_string()),
        };
        let merged = merge_context(ModeName::Tag, &context, Some(&data));
        assert_eq!(merged.comment_id, Some(42));
        assert_eq!(merged.base_branch.as_deref(), Some("release/1.2"));
        assert_eq!(merged.work_branch.as_deref(), Some("lark/issue-7"));
    }

    #[test]
    fn functional_merge_context_derives_base_branch_without_data() {
        let context = sample_context();
        let merged = merge_context(ModeName::Tag, &context, None);
        assert_eq!(merged.base_branch.as_deref(), Some("main"));
        assert_eq!(merged.comment_id, None);
        assert_eq!(merged.work_branch, None);
    }

    #[test]
    fn regression_merge_context_is_pure() {
        let context = sample_context();
        let data = ModeData {
            comment_id: Some(9),
            ..ModeData::default()
        };
        let first = merge_context(ModeName::Review, &context, Some(&data));
        let second = merge_context(ModeName::Review, &context, Some(&data));
        assert_eq!(first, second);
    }

    #[test]
    fn unit_fetched_data_prefers_comment_and_entity_fields() {
        let context = sample_context();
        let fetched = FetchedData::from_event(&context);
        assert_eq!(fetched.title.as_deref(), Some("Flaky test"));
        assert_eq!(fetched.body.as_deref(), Some("It fails on CI."));
        assert_eq!(fetched.trigger_comment.as_deref(), Some("@lark take a look"));
    }
}
