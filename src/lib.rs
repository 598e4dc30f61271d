pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod storage;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// Re-export specific items to avoid conflicts
pub use api::{ApiSession, CreateOutcome};
pub use cli::{args, commands};
pub use config::{ServerProfile, ServerRegistry};
pub use utils::{errors, paths};
pub use workflow::{WorkflowExecutor, WorkflowResult};
