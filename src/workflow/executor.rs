use crate::api::client::RequestResult;
use crate::api::handle::ResourceHandle;
use crate::api::{ApiSession, CreateOutcome};
use crate::config::WorkflowSettings;
use crate::utils::errors::{CertifyError, Result};
use crate::workflow::report::{Reporter, WorkflowEvent};
use crate::workflow::result::{Step, WorkflowResult, WorkflowStage};
use serde_json::{json, Value};
use std::time::Instant;

/// Field of the credential payload that receives the template id
const CREDENTIAL_TEMPLATE_FIELD: &str = "template_ID";

/// Handles held during one run
#[derive(Default)]
struct Held {
    folder: Option<ResourceHandle>,
    template: Option<ResourceHandle>,
    credential: Option<ResourceHandle>,
}

/// Runs the create → verify → edit → cleanup sequence against one server.
///
/// A failed create skips everything that depends on it and goes straight to
/// cleanup. Verify and edit failures are recorded and the run carries on.
pub struct WorkflowExecutor<'a> {
    session: &'a ApiSession,
    settings: &'a WorkflowSettings,
    reporter: &'a dyn Reporter,
}

impl<'a> WorkflowExecutor<'a> {
    pub fn new(
        session: &'a ApiSession,
        settings: &'a WorkflowSettings,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            session,
            settings,
            reporter,
        }
    }

    fn server(&self) -> String {
        self.session.profile().key.clone()
    }

    pub async fn run(&self) -> WorkflowResult {
        let started = Instant::now();
        let mut result = WorkflowResult::new(self.server());
        let mut held = Held::default();

        self.reporter.report(&WorkflowEvent::Started {
            server: self.server(),
            base_url: self.session.profile().base_url.clone(),
        });
        self.enter(&mut result, WorkflowStage::Init);

        if let Err(e) = self.execute(&mut result, &mut held).await {
            tracing::error!("Workflow on '{}' aborted: {e}", self.server());
            result.aborted = Some(e.to_string());
            self.reporter.report(&WorkflowEvent::Aborted {
                server: self.server(),
                error: e.to_string(),
                last_handle: result.last_handle.clone(),
            });
        }

        let completed = result.stage == WorkflowStage::Edited && result.aborted.is_none();
        self.cleanup(&mut result, &mut held).await;
        if completed {
            self.enter(&mut result, WorkflowStage::Cleaned);
            self.enter(&mut result, WorkflowStage::Done);
        }

        result.duration = started.elapsed();
        tracing::info!(
            "Workflow on '{}' finished at stage {} | {} passed, {} failed | Duration: {:.2}s",
            result.server,
            result.stage,
            result.passed_count(),
            result.failed_count(),
            result.duration.as_secs_f64()
        );
        self.reporter.report(&WorkflowEvent::Finished {
            result: result.clone(),
        });
        result
    }

    async fn execute(&self, result: &mut WorkflowResult, held: &mut Held) -> Result<()> {
        let settings = self.settings;
        let folders = self.session.folders();
        let templates = self.session.templates();
        let credentials = self.session.credentials();

        // Folder
        let outcome = folders.create(&settings.folder_name, None).await;
        let Some(folder) = self.created(result, Step::CreateFolder, outcome) else {
            return Ok(());
        };
        held.folder = Some(folder.clone());
        self.enter(result, WorkflowStage::FolderCreated);

        self.check(result, Step::GetFolder, folders.get(&folder).await);
        if let Some(institution_id) = &settings.institution_id {
            self.check(result, Step::ListFolders, folders.list_all(institution_id).await);
        }

        // Template
        let payload = link(&settings.template, &settings.folder_link_field, folder.id())?;
        let outcome = templates.create(&payload).await;
        let Some(template) = self.created(result, Step::CreateTemplate, outcome) else {
            return Ok(());
        };
        held.template = Some(template.clone());
        self.enter(result, WorkflowStage::TemplateCreated);

        self.check(result, Step::GetTemplate, templates.get(&template).await);
        if let Some(institution_id) = &settings.institution_id {
            self.check(result, Step::ListTemplates, templates.list_all(institution_id).await);
        }
        if let Some(copy_payload) = &settings.copy_template {
            self.check(result, Step::CopyTemplate, templates.copy(&template, copy_payload).await);
        }

        // Credential
        let payload = link(&settings.credential, CREDENTIAL_TEMPLATE_FIELD, template.id())?;
        let outcome = credentials.create(&payload).await;
        let Some(credential) = self.created(result, Step::CreateCredential, outcome) else {
            return Ok(());
        };
        held.credential = Some(credential.clone());
        self.enter(result, WorkflowStage::CredentialCreated);

        // Verify
        self.check(result, Step::GetCredential, credentials.get(&credential).await);
        self.check(
            result,
            Step::GetTemplateCredentials,
            templates.credentials(&template).await,
        );
        if settings.include_analytics {
            self.check(
                result,
                Step::TemplateAnalytics,
                self.session.analytics().template(&template).await,
            );
        }
        self.enter(result, WorkflowStage::Verified);

        // Edit
        self.check(
            result,
            Step::EditCredential,
            credentials
                .edit(&credential, Some(&settings.credential_edit))
                .await,
        );
        self.check(
            result,
            Step::EditTemplate,
            templates.edit(&template, Some(&settings.template_edit)).await,
        );
        self.enter(result, WorkflowStage::Edited);

        Ok(())
    }

    /// Delete whatever was created, newest first
    async fn cleanup(&self, result: &mut WorkflowResult, held: &mut Held) {
        if let Some(credential) = held.credential.take() {
            let outcome = self.session.credentials().delete(&credential).await;
            self.check(result, Step::DeleteCredential, outcome);
        }
        if let Some(template) = held.template.take() {
            let outcome = self.session.templates().delete(&template).await;
            self.check(result, Step::DeleteTemplate, outcome);
        }
        if let Some(folder) = held.folder.take() {
            let outcome = self.session.folders().delete(&folder).await;
            self.check(result, Step::DeleteFolder, outcome);
        }
    }

    /// Record a create step. Only a server-issued handle lets the run go on.
    fn created(
        &self,
        result: &mut WorkflowResult,
        step: Step,
        outcome: CreateOutcome,
    ) -> Option<ResourceHandle> {
        if !outcome.succeeded {
            self.finish_step(result, step, false, Some(outcome.result.summary()));
            return None;
        }

        let Some(handle) = outcome.handle else {
            self.finish_step(result, step, false, Some("no handle returned".to_string()));
            return None;
        };
        result.last_handle = Some(handle.clone());
        match handle.require_verified() {
            Ok(handle) => {
                self.finish_step(result, step, true, None);
                Some(handle)
            }
            Err(e) => {
                tracing::error!("{e}");
                self.finish_step(result, step, false, Some(e.to_string()));
                None
            }
        }
    }

    fn check(&self, result: &mut WorkflowResult, step: Step, outcome: RequestResult) {
        let detail = (!outcome.succeeded).then(|| outcome.summary());
        self.finish_step(result, step, outcome.succeeded, detail);
    }

    fn finish_step(&self, result: &mut WorkflowResult, step: Step, passed: bool, detail: Option<String>) {
        if passed {
            tracing::info!("[{}] {step}: PASS", result.server);
        } else {
            tracing::warn!(
                "[{}] {step}: FAIL ({})",
                result.server,
                detail.as_deref().unwrap_or("no detail")
            );
        }
        result.record(step, passed, detail.clone());
        self.reporter.report(&WorkflowEvent::StepFinished {
            server: result.server.clone(),
            step,
            passed,
            detail,
        });
    }

    fn enter(&self, result: &mut WorkflowResult, stage: WorkflowStage) {
        debug_assert!(stage >= result.stage);
        result.stage = stage;
        self.reporter.report(&WorkflowEvent::StageEntered {
            server: result.server.clone(),
            stage,
        });
    }
}

/// Copy a payload object and set one linking field on it
fn link(payload: &Value, field: &str, id: &str) -> Result<Value> {
    let mut linked = match payload {
        Value::Object(fields) => fields.clone(),
        Value::Null => Default::default(),
        other => {
            return Err(CertifyError::InvalidInput(format!(
                "Workflow payload must be a JSON object, got {other}"
            )))
        }
    };
    linked.insert(field.to_string(), json!(id));
    Ok(Value::Object(linked))
}
