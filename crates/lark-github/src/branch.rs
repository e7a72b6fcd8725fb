use sha2::{Digest, Sha256};

use crate::event_context::EventContext;

/// Prefix for every branch the assistant owns.
pub const WORK_BRANCH_PREFIX: &str = "lark/";

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Short stable digest for identifiers derived from event keys.
pub fn short_key_hash(input: &str) -> String {
    let mut hash = sha256_hex(input);
    hash.truncate(12);
    hash
}

pub fn sanitize_for_branch(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == '/' {
                ch
            } else {
                '-'
            }
        })
        .collect()
}

/// Deterministic working-branch name for an event. Repeated events against
/// the same issue/PR map to the same branch, so reuse-if-exists resolution
/// converges without locking. Events with no entity number fall back to a
/// hash of the event key.
pub fn work_branch_for_event(context: &EventContext) -> String {
    if let Some(pr) = &context.pull_request {
        return format!("{WORK_BRANCH_PREFIX}pr-{}", pr.number);
    }
    if let Some(issue) = &context.issue {
        return format!("{WORK_BRANCH_PREFIX}issue-{}", issue.number);
    }
    format!(
        "{WORK_BRANCH_PREFIX}{}-{}",
        sanitize_for_branch(context.kind.as_str()),
        short_key_hash(&context.event_key())
    )
}
