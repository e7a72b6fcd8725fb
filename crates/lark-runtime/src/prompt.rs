use lark_modes::{FetchedData, ModeContext};

/// Default prompt builder used whenever the selected mode supplies no
/// override. Assembles repository, branch, entity, and trigger-comment
/// context into one instruction block.
pub fn default_prompt(prepared: &ModeContext, fetched: &FetchedData) -> String {
    let repo = prepared.event.repo.slug();
    let branch = prepared
        .work_branch
        .as_deref()
        .or(prepared.base_branch.as_deref())
        .unwrap_or("the current branch");
    let mut sections = vec![format!(
        "You are the Lark assistant (mode: {}) working in {repo}. Commit your changes to `{branch}`.",
        prepared.mode
    )];
    if let Some(number) = prepared.event.entity_number() {
        let surface = if prepared.event.is_pull_request() {
            "pull request"
        } else {
            "issue"
        };
        match fetched.title.as_deref() {
            Some(title) => sections.push(format!("Context: {surface} #{number}: {title}.")),
            None => sections.push(format!("Context: {surface} #{number}.")),
        }
    }
    if let Some(body) = fetched.body.as_deref().filter(|body| !body.trim().is_empty()) {
        sections.push(format!("Description:\n{body}"));
    }
    if let Some(comment) = fetched
        .trigger_comment
        .as_deref()
        .filter(|comment| !comment.trim().is_empty())
    {
        sections.push(format!("Request:\n{comment}"));
    }
    sections.push(
        "Address the request above. Keep changes minimal and explain what you did."
            .to_string(),
    );
    sections.join("\n\n")
}
