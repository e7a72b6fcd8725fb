use std::sync::Arc;

use crate::agent::AgentMode;
use crate::contract::{Mode, ModeName, ModeSettings};
use crate::review::ReviewMode;
use crate::tag::TagMode;

/// Every selectable mode, for callers that need to enumerate the closed set.
pub const ALL_MODE_NAMES: &[ModeName] = &[ModeName::Tag, ModeName::Agent, ModeName::Review];

/// Closed-set lookup from configuration name to strategy. Exactly one mode
/// instance is active per run; the registry never arbitrates between modes.
pub fn mode_for(name: ModeName, settings: &ModeSettings) -> Arc<dyn Mode> {
    match name {
        ModeName::Tag => Arc::new(TagMode::new(settings)),
        ModeName::Agent => Arc::new(AgentMode),
        ModeName::Review => Arc::new(ReviewMode),
    }
}
