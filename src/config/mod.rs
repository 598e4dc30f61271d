pub mod profile;
pub mod registry;
pub mod workflow;

pub use profile::{AuthScheme, ServerProfile};
pub use registry::{token_env_var, ServerRegistry};
pub use workflow::WorkflowSettings;
