mod bootstrap_helpers;
mod cli_args;
mod cli_types;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use lark_github::event_context::EventContext;
use lark_modes::{ModeData, ModeName, ModeSettings};
use lark_runtime::{prepare_run, HttpGithubClient, RunRequest};

use crate::cli_args::LarkArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = LarkArgs::parse();
    bootstrap_helpers::init_tracing();

    let raw = std::fs::read_to_string(&args.event_path).with_context(|| {
        format!("failed to read event payload {}", args.event_path.display())
    })?;
    let payload = serde_json::from_str(&raw).with_context(|| {
        format!("failed to parse event payload {}", args.event_path.display())
    })?;

    // A payload this layer cannot interpret means "do not trigger", not a
    // crashed run.
    let event = match EventContext::from_webhook(&args.event_name, payload) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(event = %args.event_name, %error, "event not dispatchable");
            print_summary(&json!({ "triggered": false, "reason": error.to_string() }))?;
            return Ok(());
        }
    };

    let github = HttpGithubClient::new(
        args.api_base.clone(),
        args.github_token.clone(),
        args.request_timeout_ms,
        args.retry_max_attempts,
        args.retry_base_delay_ms,
    )?;

    let mode = ModeName::from(args.mode);
    let data = build_mode_data(&args);
    let request = RunRequest {
        mode,
        settings: ModeSettings {
            trigger_phrase: args.trigger_phrase.clone(),
            assignee_trigger: args.assignee_trigger.clone(),
        },
        event,
        github: Arc::new(github),
        github_token: args.github_token.clone(),
        data,
    };

    match prepare_run(request).await? {
        Some(prepared) => {
            print_summary(&json!({
                "triggered": true,
                "mode": mode.as_str(),
                "comment_id": prepared.result.comment_id,
                "branch_info": prepared.result.branch_info,
                "mcp_config": prepared.result.mcp_config,
                "prompt": prepared.prompt,
            }))?;
        }
        None => {
            print_summary(&json!({ "triggered": false, "mode": mode.as_str() }))?;
        }
    }
    Ok(())
}

fn build_mode_data(args: &LarkArgs) -> Option<ModeData> {
    if args.comment_id.is_none() && args.base_branch.is_none() && args.work_branch.is_none() {
        return None;
    }
    Some(ModeData {
        comment_id: args.comment_id,
        base_branch: args.base_branch.clone(),
        work_branch: args.work_branch.clone(),
    })
}

fn print_summary(summary: &serde_json::Value) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(summary).context("failed to render run summary")?;
    println!("{rendered}");
    Ok(())
}
