//! Single-run pipeline for the Lark mode-dispatch layer: trigger evaluation,
//! environment preparation, and prompt-context assembly, plus the
//! reqwest-backed GitHub client implementation.

pub mod github_api_client;
pub mod pipeline;
pub mod prompt;

pub use github_api_client::HttpGithubClient;
pub use pipeline::{prepare_run, RunPreparation, RunRequest};
pub use prompt::default_prompt;
