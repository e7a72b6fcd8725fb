//! Mode dispatch core: the uniform contract behind which trigger semantics,
//! tool permission policy, tracking-comment policy, and environment
//! preparation vary per execution mode.
//!
//! The caller selects one mode by name per run and drives it through the
//! same operation set regardless of the concrete strategy; see
//! [`contract::Mode`].

pub mod agent;
pub mod contract;
pub mod error;
pub mod prepare;
pub mod registry;
pub mod review;
pub mod tag;
pub mod tool_policy;

pub use contract::{
    merge_context, BranchInfo, FetchedData, Mode, ModeContext, ModeData, ModeName, ModeOptions,
    ModeResult, ModeSettings,
};
pub use error::{PrepareError, UnknownModeError};
pub use prepare::EnvironmentPreparer;
pub use registry::{mode_for, ALL_MODE_NAMES};
pub use tool_policy::ToolPolicy;
