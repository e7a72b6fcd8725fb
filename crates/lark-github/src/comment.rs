use chrono::{SecondsFormat, Utc};

pub const RUN_KEY_MARKER_PREFIX: &str = "<!-- lark-run:";
pub const RUN_KEY_MARKER_SUFFIX: &str = " -->";

/// Hidden marker embedded in tracking comments so later pipeline stages can
/// locate and update the same comment instead of posting new ones.
pub fn render_run_marker(event_key: &str) -> String {
    format!("{RUN_KEY_MARKER_PREFIX}{event_key}{RUN_KEY_MARKER_SUFFIX}")
}

/// Extract the run key from a previously posted tracking comment, if any.
pub fn extract_run_marker(body: &str) -> Option<String> {
    let start = body.find(RUN_KEY_MARKER_PREFIX)? + RUN_KEY_MARKER_PREFIX.len();
    let end = body[start..].find(RUN_KEY_MARKER_SUFFIX)?;
    let key = body[start..start + end].trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Initial body of the tracking comment. The working branch is resolved
/// before the comment is created, so the branch line can always name it.
pub fn render_tracking_comment(event_key: &str, work_branch: Option<&str>) -> String {
    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let branch_line = match work_branch {
        Some(branch) => format!("Working branch: `{branch}`"),
        None => "Working directly on the event's current branch.".to_string(),
    };
    format!(
        "**Lark is on it.**\n\n{branch_line}\nStarted at `{started_at}`.\n\n{}",
        render_run_marker(event_key)
    )
}
