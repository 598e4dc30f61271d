use crate::api::handle::ResourceHandle;
use chrono::{DateTime, Utc};
use ordermap::OrderMap;
use std::fmt;
use std::time::Duration;

/// Progress of one workflow run. Stages are only ever entered in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStage {
    Init,
    FolderCreated,
    TemplateCreated,
    CredentialCreated,
    Verified,
    Edited,
    Cleaned,
    Done,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Init => "init",
            WorkflowStage::FolderCreated => "folder-created",
            WorkflowStage::TemplateCreated => "template-created",
            WorkflowStage::CredentialCreated => "credential-created",
            WorkflowStage::Verified => "verified",
            WorkflowStage::Edited => "edited",
            WorkflowStage::Cleaned => "cleaned",
            WorkflowStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CreateFolder,
    GetFolder,
    ListFolders,
    CreateTemplate,
    GetTemplate,
    ListTemplates,
    CopyTemplate,
    CreateCredential,
    GetCredential,
    GetTemplateCredentials,
    TemplateAnalytics,
    EditCredential,
    EditTemplate,
    DeleteCredential,
    DeleteTemplate,
    DeleteFolder,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::CreateFolder => "create_folder",
            Step::GetFolder => "get_folder",
            Step::ListFolders => "list_folders",
            Step::CreateTemplate => "create_template",
            Step::GetTemplate => "get_template",
            Step::ListTemplates => "list_templates",
            Step::CopyTemplate => "copy_template",
            Step::CreateCredential => "create_credential",
            Step::GetCredential => "get_credential",
            Step::GetTemplateCredentials => "get_template_credentials",
            Step::TemplateAnalytics => "template_analytics",
            Step::EditCredential => "edit_credential",
            Step::EditTemplate => "edit_template",
            Step::DeleteCredential => "delete_credential",
            Step::DeleteTemplate => "delete_template",
            Step::DeleteFolder => "delete_folder",
        }
    }

    /// Human label for console output
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one run against one server profile.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub server: String,
    /// Step name to pass/fail, in execution order. Skipped steps are absent.
    pub steps: OrderMap<String, bool>,
    /// Failure reason per failed step
    pub failures: OrderMap<String, String>,
    pub stage: WorkflowStage,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub last_handle: Option<ResourceHandle>,
    /// Set when the run stopped on an unrecoverable error
    pub aborted: Option<String>,
}

impl WorkflowResult {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            steps: OrderMap::new(),
            failures: OrderMap::new(),
            stage: WorkflowStage::Init,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            last_handle: None,
            aborted: None,
        }
    }

    /// Result for a server whose session could not be set up
    pub fn not_started(server: impl Into<String>, error: impl Into<String>) -> Self {
        let mut result = Self::new(server);
        result.aborted = Some(error.into());
        result
    }

    pub fn record(&mut self, step: Step, passed: bool, reason: Option<String>) {
        self.steps.insert(step.as_str().to_string(), passed);
        if let (false, Some(reason)) = (passed, reason) {
            self.failures.insert(step.as_str().to_string(), reason);
        }
    }

    pub fn step(&self, step: Step) -> Option<bool> {
        self.steps.get(step.as_str()).copied()
    }

    pub fn passed_count(&self) -> usize {
        self.steps.values().filter(|passed| **passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.steps.len() - self.passed_count()
    }

    /// Every step ran and passed
    pub fn success(&self) -> bool {
        self.aborted.is_none()
            && self.stage == WorkflowStage::Done
            && self.steps.values().all(|passed| *passed)
    }
}
