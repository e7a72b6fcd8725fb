use async_trait::async_trait;

use lark_github::event_context::EventContext;

use crate::contract::{Mode, ModeName, ModeOptions, ModeResult};
use crate::error::PrepareError;
use crate::prepare::EnvironmentPreparer;
use crate::tool_policy::{agent_tool_policy, ToolPolicy};

/// The automation mode: the caller has already decided activation is
/// warranted (scheduled runs, workflow dispatch), so the trigger always
/// fires. No tracking comment; permissions defer to the caller.
pub struct AgentMode;

#[async_trait]
impl Mode for AgentMode {
    fn name(&self) -> ModeName {
        ModeName::Agent
    }

    fn description(&self) -> &'static str {
        "externally scheduled automation with no trigger checking"
    }

    fn should_trigger(&self, _context: &EventContext) -> bool {
        true
    }

    fn tool_policy(&self) -> ToolPolicy {
        agent_tool_policy()
    }

    fn creates_tracking_comment(&self) -> bool {
        false
    }

    async fn prepare(&self, options: &ModeOptions) -> Result<ModeResult, PrepareError> {
        EnvironmentPreparer::new(options.github.as_ref())
            .prepare(
                &options.context,
                options.data.as_ref(),
                true,
                self.creates_tracking_comment(),
                &options.github_token,
            )
            .await
    }
}
