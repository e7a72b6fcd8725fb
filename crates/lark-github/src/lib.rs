//! GitHub event model and client port for the Lark mode-dispatch layer.
//! Provides webhook payload parsing, mention detection, branch naming,
//! tracking-comment rendering, and transport retry helpers consumed by the
//! mode core and runtime crates.

pub mod branch;
pub mod client;
pub mod comment;
pub mod event_context;
pub mod mention;
pub mod transport;

pub use client::{BranchRef, CreatedComment, GithubApiError, GithubClient};
pub use event_context::{
    EventContext, EventParseError, GithubEventKind, GithubUser, RepoRef,
};
