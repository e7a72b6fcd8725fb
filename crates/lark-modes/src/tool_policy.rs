use std::collections::BTreeSet;

const READ_TOOLS: &[&str] = &["Read", "Glob", "Grep", "LS"];
const WRITE_TOOLS: &[&str] = &["Edit", "MultiEdit", "Write", "NotebookEdit"];
const EXEC_TOOLS: &[&str] = &["Bash"];
const COMMENT_TOOLS: &[&str] = &["mcp__github_comment__update_comment"];
const REVIEW_TOOLS: &[&str] = &["mcp__github_review__submit_review"];

/// Disjoint allow/deny capability sets. When both sets are empty the
/// downstream invocation's default permission model applies unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPolicy {
    allowed: BTreeSet<String>,
    disallowed: BTreeSet<String>,
}

impl ToolPolicy {
    /// Build a policy from raw lists. A name appearing in both lists is kept
    /// only in the disallowed set: disallow wins on conflict, so the
    /// disjointness invariant holds by construction.
    pub fn new<A, D>(allowed: A, disallowed: D) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let disallowed: BTreeSet<String> = disallowed.into_iter().map(Into::into).collect();
        let allowed = allowed
            .into_iter()
            .map(Into::into)
            .filter(|tool| !disallowed.contains(tool))
            .collect();
        Self { allowed, disallowed }
    }

    pub fn empty() -> Self {
        Self {
            allowed: BTreeSet::new(),
            disallowed: BTreeSet::new(),
        }
    }

    pub fn allowed(&self) -> Vec<String> {
        self.allowed.iter().cloned().collect()
    }

    pub fn disallowed(&self) -> Vec<String> {
        self.disallowed.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.disallowed.is_empty()
    }

    /// Decision for a single tool: `Some(false)` when denied, `Some(true)`
    /// when explicitly granted, `None` when this policy has no opinion.
    /// Deny is checked first so downstream callers applying allow-then-deny
    /// reach the same answer.
    pub fn permits(&self, tool: &str) -> Option<bool> {
        if self.disallowed.contains(tool) {
            return Some(false);
        }
        if self.allowed.contains(tool) {
            return Some(true);
        }
        None
    }
}

/// Tag grants the full editing surface plus tracking-comment updates.
pub fn tag_tool_policy() -> ToolPolicy {
    ToolPolicy::new(
        READ_TOOLS
            .iter()
            .chain(WRITE_TOOLS)
            .chain(EXEC_TOOLS)
            .chain(COMMENT_TOOLS)
            .copied(),
        std::iter::empty::<String>(),
    )
}

/// Agent runs are externally scheduled automation: the caller's own
/// configuration decides permissions, so both sets stay empty.
pub fn agent_tool_policy() -> ToolPolicy {
    ToolPolicy::empty()
}

/// Review is read-only: inspection and review submission, with every
/// write/edit/execute tool explicitly denied.
pub fn review_tool_policy() -> ToolPolicy {
    ToolPolicy::new(
        READ_TOOLS
            .iter()
            .chain(COMMENT_TOOLS)
            .chain(REVIEW_TOOLS)
            .copied(),
        WRITE_TOOLS.iter().chain(EXEC_TOOLS).copied(),
    )
}
