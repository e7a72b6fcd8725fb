use thiserror::Error;

use lark_github::client::GithubApiError;

#[derive(Debug, Error)]
#[error("unknown mode: {0} (expected tag, agent, or review)")]
/// Invalid mode selection value; rejected before the pipeline starts.
pub struct UnknownModeError(pub String);

#[derive(Debug, Error)]
/// Environment preparation failure. Terminal for the run; each variant
/// names the state transition that failed.
pub enum PrepareError {
    #[error("failed to look up working branch {branch}: {source}")]
    BranchLookup {
        branch: String,
        #[source]
        source: GithubApiError,
    },
    #[error("failed to resolve base branch {branch}: {source}")]
    BaseBranchLookup {
        branch: String,
        #[source]
        source: GithubApiError,
    },
    #[error("failed to create working branch {branch}: {source}")]
    BranchCreate {
        branch: String,
        #[source]
        source: GithubApiError,
    },
    #[error("failed to create tracking comment: {0}")]
    CommentCreate(#[source] GithubApiError),
    #[error("event carries no issue or pull request to attach a tracking comment to")]
    MissingCommentSurface,
}
