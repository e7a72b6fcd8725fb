use std::path::PathBuf;

use clap::Parser;

use crate::cli_types::CliModeName;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "lark",
    about = "Mode-dispatch runner for the Lark coding assistant",
    version
)]
pub struct LarkArgs {
    /// Execution mode for this run.
    #[arg(long, value_enum)]
    pub mode: CliModeName,

    /// Webhook event name (the X-GitHub-Event header value).
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub event_name: String,

    /// Path to the webhook payload JSON file.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: PathBuf,

    /// Token used for all GitHub API calls.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// GitHub API base URL.
    #[arg(long, default_value = "https://api.github.com")]
    pub api_base: String,

    /// Handle whose mention activates the assistant.
    #[arg(long, default_value = "@lark")]
    pub trigger_phrase: String,

    /// Login whose issue assignment activates the assistant.
    #[arg(long)]
    pub assignee_trigger: Option<String>,

    /// Reuse a tracking comment from a prior run instead of creating one.
    #[arg(long)]
    pub comment_id: Option<u64>,

    /// Override the resolved base branch.
    #[arg(long)]
    pub base_branch: Option<String>,

    /// Override the derived working branch name.
    #[arg(long)]
    pub work_branch: Option<String>,

    #[arg(long, default_value_t = 30_000, value_parser = parse_positive_u64)]
    pub request_timeout_ms: u64,

    #[arg(long, default_value_t = 3, value_parser = parse_positive_usize)]
    pub retry_max_attempts: usize,

    #[arg(long, default_value_t = 500, value_parser = parse_positive_u64)]
    pub retry_base_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::LarkArgs;
    use clap::Parser;

    #[test]
    fn functional_args_parse_with_minimal_flags() {
        let args = LarkArgs::parse_from([
            "lark",
            "--mode",
            "tag",
            "--event-name",
            "issue_comment",
            "--event-path",
            "/tmp/event.json",
            "--github-token",
            "token",
        ]);
        assert_eq!(args.trigger_phrase, "@lark");
        assert_eq!(args.api_base, "https://api.github.com");
        assert_eq!(args.retry_max_attempts, 3);
        assert_eq!(args.comment_id, None);
    }

    #[test]
    fn regression_invalid_mode_is_rejected_before_the_pipeline() {
        let outcome = LarkArgs::try_parse_from([
            "lark",
            "--mode",
            "batch",
            "--event-name",
            "issues",
            "--event-path",
            "/tmp/event.json",
            "--github-token",
            "token",
        ]);
        assert!(outcome.is_err());
    }

    #[test]
    fn regression_zero_retry_attempts_are_rejected() {
        let outcome = LarkArgs::try_parse_from([
            "lark",
            "--mode",
            "agent",
            "--event-name",
            "schedule",
            "--event-path",
            "/tmp/event.json",
            "--github-token",
            "token",
            "--retry-max-attempts",
            "0",
        ]);
        assert!(outcome.is_err());
    }
}
