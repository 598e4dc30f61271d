use crate::api::handle::ResourceHandle;
use crate::workflow::result::{Step, WorkflowResult, WorkflowStage};
use std::sync::Mutex;

/// Progress events emitted by the executor.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    Started {
        server: String,
        base_url: String,
    },
    StageEntered {
        server: String,
        stage: WorkflowStage,
    },
    StepFinished {
        server: String,
        step: Step,
        passed: bool,
        detail: Option<String>,
    },
    Aborted {
        server: String,
        error: String,
        last_handle: Option<ResourceHandle>,
    },
    Finished {
        result: WorkflowResult,
    },
}

/// Consumer of workflow events
pub trait Reporter: Send + Sync {
    fn report(&self, event: &WorkflowEvent);
}

/// Prints per-step PASS/FAIL lines and a final tally
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::Started { server, base_url } => {
                tracing::info!("Workflow started on '{server}' ({base_url})");
                if !self.quiet {
                    println!();
                    println!("Testing on server: {} ({base_url})", server.to_uppercase());
                    println!("{}", "-".repeat(40));
                }
            }
            WorkflowEvent::StageEntered { server, stage } => {
                tracing::debug!("[{server}] stage -> {stage}");
            }
            WorkflowEvent::StepFinished {
                step, passed, detail, ..
            } => {
                if !self.quiet {
                    let verdict = if *passed { "PASS" } else { "FAIL" };
                    match detail {
                        Some(detail) if !passed => {
                            println!("   {}: {verdict} ({detail})", step.label())
                        }
                        _ => println!("   {}: {verdict}", step.label()),
                    }
                }
            }
            WorkflowEvent::Aborted {
                server,
                error,
                last_handle,
            } => {
                let handle = last_handle
                    .as_ref()
                    .map(|h| h.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                tracing::error!("[{server}] workflow aborted: {error} (last handle: {handle})");
            }
            WorkflowEvent::Finished { result } => {
                if !self.quiet {
                    println!(
                        "   Result: {} passed, {} failed, {:.2}s",
                        result.passed_count(),
                        result.failed_count(),
                        result.duration.as_secs_f64()
                    );
                }
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &WorkflowEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Summary message for the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn from_result(result: &WorkflowResult) -> Self {
        let handle = result
            .last_handle
            .as_ref()
            .map(|h| h.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        if result.success() {
            return Self {
                subject: format!("Workflow on '{}' completed successfully", result.server),
                body: format!(
                    "The workflow executed successfully.\n\n\
                     Steps passed: {}\n\
                     Last handle: {handle}\n\
                     Total Duration: {:.2}s\n",
                    result.passed_count(),
                    result.duration.as_secs_f64()
                ),
            };
        }

        let mut body = String::from("The workflow encountered a failure.\n\n");
        if let Some(error) = &result.aborted {
            body.push_str(&format!("Error: {error}\n"));
        }
        for (step, reason) in &result.failures {
            body.push_str(&format!("Failed step {step}: {reason}\n"));
        }
        body.push_str(&format!("Stage reached: {}\n", result.stage));
        body.push_str(&format!("Last handle: {handle}\n"));

        Self {
            subject: format!("Workflow on '{}' failed", result.server),
            body,
        }
    }
}

/// Delivers run summaries somewhere outside the process
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes summaries to stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) {
        eprintln!();
        eprintln!("{}", notification.subject);
        eprint!("{}", notification.body);
    }
}
