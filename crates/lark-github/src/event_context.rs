use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// GitHub account identity as it appears in webhook payloads.
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Repository identity plus the default branch used as the fallback base.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}

impl RepoRef {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates the webhook event shapes the dispatch layer understands.
pub enum GithubEventKind {
    IssueComment,
    IssueOpened,
    IssueAssigned,
    PullRequestOpened,
    PullRequestSynchronize,
    PullRequestReviewComment,
    PullRequestReview,
    WorkflowDispatch,
    Schedule,
}

impl GithubEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssueComment => "issue_comment",
            Self::IssueOpened => "issue_opened",
            Self::IssueAssigned => "issue_assigned",
            Self::PullRequestOpened => "pull_request_opened",
            Self::PullRequestSynchronize => "pull_request_synchronize",
            Self::PullRequestReviewComment => "pull_request_review_comment",
            Self::PullRequestReview => "pull_request_review",
            Self::WorkflowDispatch => "workflow_dispatch",
            Self::Schedule => "schedule",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Issue fields needed for trigger evaluation and branch naming.
pub struct IssueView {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub assignee: Option<GithubUser>,
    /// True when the "issue" is the issue-side view of a pull request.
    pub is_pull_request: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Pull-request fields needed for trigger evaluation and branch resolution.
pub struct PullRequestView {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub base_branch: String,
    pub head_branch: String,
    pub state: String,
}

impl PullRequestView {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// The comment (or review body) that carried the triggering text.
pub struct CommentView {
    pub id: u64,
    pub body: String,
}

#[derive(Debug, Error)]
/// Failure to map a webhook payload onto the event model. Callers treat
/// this as "do not trigger" rather than a fatal condition.
pub enum EventParseError {
    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),
    #[error("unsupported action {action} for event {event}")]
    UnsupportedAction { event: String, action: String },
    #[error("malformed {event} payload: {source}")]
    MalformedPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Immutable description of the triggering repository event. Built once by
/// the caller before the pipeline starts; no mode mutates it.
pub struct EventContext {
    pub kind: GithubEventKind,
    pub repo: RepoRef,
    pub actor: GithubUser,
    pub issue: Option<IssueView>,
    pub pull_request: Option<PullRequestView>,
    pub comment: Option<CommentView>,
    /// Raw webhook payload for consumers that need fields beyond the views.
    pub payload: Value,
}

impl EventContext {
    /// Parse a webhook payload into the event model. The event name is the
    /// `X-GitHub-Event` header value (or `GITHUB_EVENT_NAME`).
    pub fn from_webhook(event_name: &str, payload: Value) -> Result<Self, EventParseError> {
        let malformed = |source| EventParseError::MalformedPayload {
            event: event_name.to_string(),
            source,
        };
        match event_name {
            "issue_comment" => {
                let raw: IssueCommentPayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                require_action(event_name, &raw.action, &["created", "edited"])?;
                Ok(Self {
                    kind: GithubEventKind::IssueComment,
                    repo: raw.repository.into_repo(),
                    actor: raw.sender,
                    issue: Some(raw.issue.into_view()),
                    pull_request: None,
                    comment: Some(CommentView {
                        id: raw.comment.id,
                        body: raw.comment.body.unwrap_or_default(),
                    }),
                    payload,
                })
            }
            "issues" => {
                let raw: IssuesPayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                let kind = match raw.action.as_str() {
                    "opened" => GithubEventKind::IssueOpened,
                    "assigned" => GithubEventKind::IssueAssigned,
                    other => {
                        return Err(EventParseError::UnsupportedAction {
                            event: event_name.to_string(),
                            action: other.to_string(),
                        })
                    }
                };
                Ok(Self {
                    kind,
                    repo: raw.repository.into_repo(),
                    actor: raw.sender,
                    issue: Some(raw.issue.into_view()),
                    pull_request: None,
                    comment: None,
                    payload,
                })
            }
            "pull_request" => {
                let raw: PullRequestPayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                let kind = match raw.action.as_str() {
                    "opened" | "reopened" => GithubEventKind::PullRequestOpened,
                    "synchronize" => GithubEventKind::PullRequestSynchronize,
                    other => {
                        return Err(EventParseError::UnsupportedAction {
                            event: event_name.to_string(),
                            action: other.to_string(),
                        })
                    }
                };
                Ok(Self {
                    kind,
                    repo: raw.repository.into_repo(),
                    actor: raw.sender,
                    issue: None,
                    pull_request: Some(raw.pull_request.into_view()),
                    comment: None,
                    payload,
                })
            }
            "pull_request_review_comment" => {
                let raw: PullRequestCommentPayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                require_action(event_name, &raw.action, &["created", "edited"])?;
                Ok(Self {
                    kind: GithubEventKind::PullRequestReviewComment,
                    repo: raw.repository.into_repo(),
                    actor: raw.sender,
                    issue: None,
                    pull_request: Some(raw.pull_request.into_view()),
                    comment: Some(CommentView {
                        id: raw.comment.id,
                        body: raw.comment.body.unwrap_or_default(),
                    }),
                    payload,
                })
            }
            "pull_request_review" => {
                let raw: PullRequestReviewPayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                require_action(event_name, &raw.action, &["submitted", "edited"])?;
                Ok(Self {
                    kind: GithubEventKind::PullRequestReview,
                    repo: raw.repository.into_repo(),
                    actor: raw.sender,
                    issue: None,
                    pull_request: Some(raw.pull_request.into_view()),
                    comment: Some(CommentView {
                        id: raw.review.id,
                        body: raw.review.body.unwrap_or_default(),
                    }),
                    payload,
                })
            }
            "workflow_dispatch" | "schedule" => {
                let raw: BarePayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                let kind = if event_name == "schedule" {
                    GithubEventKind::Schedule
                } else {
                    GithubEventKind::WorkflowDispatch
                };
                Ok(Self {
                    kind,
                    repo: raw.repository.into_repo(),
                    actor: raw.sender.unwrap_or(GithubUser {
                        login: "github-actions".to_string(),
                    }),
                    issue: None,
                    pull_request: None,
                    comment: None,
                    payload,
                })
            }
            other => Err(EventParseError::UnsupportedEvent(other.to_string())),
        }
    }

    /// Issue or pull-request number behind this event, when one exists.
    pub fn entity_number(&self) -> Option<u64> {
        self.pull_request
            .as_ref()
            .map(|pr| pr.number)
            .or_else(|| self.issue.as_ref().map(|issue| issue.number))
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
            || self
                .issue
                .as_ref()
                .map(|issue| issue.is_pull_request)
                .unwrap_or(false)
    }

    /// The target branch of the event: PR base for pull-request events,
    /// otherwise the repository default branch.
    pub fn base_branch(&self) -> &str {
        self.pull_request
            .as_ref()
            .map(|pr| pr.base_branch.as_str())
            .unwrap_or(self.repo.default_branch.as_str())
    }

    /// Stable key identifying this event, used for hashed branch names and
    /// log correlation.
    pub fn event_key(&self) -> String {
        let suffix = if let Some(comment) = &self.comment {
            format!("comment-{}", comment.id)
        } else if let Some(number) = self.entity_number() {
            format!("entity-{number}")
        } else {
            self.kind.as_str().to_string()
        };
        format!("{}:{}:{}", self.repo.slug(), self.kind.as_str(), suffix)
    }
}

fn require_action(
    event: &str,
    action: &str,
    supported: &[&str],
) -> Result<(), EventParseError> {
    if supported.contains(&action) {
        return Ok(());
    }
    Err(EventParseError::UnsupportedAction {
        event: event.to_string(),
        action: action.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: GithubUser,
    default_branch: String,
}

impl RepositoryPayload {
    fn into_repo(self) -> RepoRef {
        RepoRef {
            owner: self.owner.login,
            name: self.name,
            default_branch: self.default_branch,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IssuePayload {
    number: u64,
    title: String,
    body: Option<String>,
    #[serde(default)]
    assignee: Option<GithubUser>,
    #[serde(default)]
    pull_request: Option<Value>,
}

impl IssuePayload {
    fn into_view(self) -> IssueView {
        IssueView {
            number: self.number,
            title: self.title,
            body: self.body,
            assignee: self.assignee,
            is_pull_request: self.pull_request.is_some(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CommentPayload {
    id: u64,
    body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BranchTargetPayload {
    #[serde(rename = "ref")]
    branch: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestDetailPayload {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    base: BranchTargetPayload,
    head: BranchTargetPayload,
}

impl PullRequestDetailPayload {
    fn into_view(self) -> PullRequestView {
        PullRequestView {
            number: self.number,
            title: self.title,
            body: self.body,
            base_branch: self.base.branch,
            head_branch: self.head.branch,
            state: self.state,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IssueCommentPayload {
    action: String,
    issue: IssuePayload,
    comment: CommentPayload,
    repository: RepositoryPayload,
    sender: GithubUser,
}

#[derive(Debug, Clone, Deserialize)]
struct IssuesPayload {
    action: String,
    issue: IssuePayload,
    repository: RepositoryPayload,
    sender: GithubUser,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestPayload {
    action: String,
    pull_request: PullRequestDetailPayload,
    repository: RepositoryPayload,
    sender: GithubUser,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestCommentPayload {
    action: String,
    pull_request: PullRequestDetailPayload,
    comment: CommentPayload,
    repository: RepositoryPayload,
    sender: GithubUser,
}

#[derive(Debug, Clone, Deserialize)]
struct PullRequestReviewPayload {
    action: String,
    pull_request: PullRequestDetailPayload,
    review: CommentPayload,
    repository: RepositoryPayload,
    sender: GithubUser,
}

#[derive(Debug, Clone, Deserialize)]
struct BarePayload {
    repository: RepositoryPayload,
    #[serde(default)]
    sender: Option<GithubUser>,
}
