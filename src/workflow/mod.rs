pub mod executor;
pub mod report;
pub mod result;

pub use executor::WorkflowExecutor;
pub use report::{
    ConsoleNotifier, ConsoleReporter, Notification, Notifier, RecordingReporter, Reporter,
    WorkflowEvent,
};
pub use result::{Step, WorkflowResult, WorkflowStage};

use crate::api::ApiSession;
use crate::config::WorkflowSettings;
use crate::utils::errors::Result;

/// Run the workflow on each server in turn and notify once per run.
///
/// Sessions are opened one at a time. A server whose session cannot be
/// opened, or whose run fails, does not stop the next one.
pub async fn run_sequentially<F>(
    servers: &[String],
    open_session: F,
    settings: &WorkflowSettings,
    reporter: &dyn Reporter,
    notifier: &dyn Notifier,
) -> Vec<WorkflowResult>
where
    F: Fn(&str) -> Result<ApiSession>,
{
    let mut results = Vec::with_capacity(servers.len());
    for server in servers {
        let result = match open_session(server.as_str()) {
            Ok(session) => WorkflowExecutor::new(&session, settings, reporter).run().await,
            Err(e) => {
                tracing::error!("Cannot run workflow on '{server}': {e}");
                let result = WorkflowResult::not_started(server.as_str(), e.to_string());
                reporter.report(&WorkflowEvent::Aborted {
                    server: server.clone(),
                    error: e.to_string(),
                    last_handle: None,
                });
                result
            }
        };
        notifier.notify(&Notification::from_result(&result));
        results.push(result);
    }
    results
}
