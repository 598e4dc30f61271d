use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Payloads and optional steps for the workflow run.
///
/// Payload shapes belong to the vendor; these are only starting points that
/// the executor extends with the linking identifiers (folder id in the
/// template payload, template id in the credential payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Enables the list-all steps for folders and templates
    pub institution_id: Option<String>,
    pub folder_name: String,
    /// Field of the template payload that receives the folder id
    pub folder_link_field: String,
    pub template: Value,
    pub template_edit: Value,
    pub credential: Value,
    pub credential_edit: Value,
    /// Payload for the copy-template step; the step is skipped when unset
    pub copy_template: Option<Value>,
    pub include_analytics: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            institution_id: None,
            folder_name: "Automation Folder".to_string(),
            folder_link_field: "folder_ID".to_string(),
            template: json!({
                "name": "Automation Template",
                "event": "Automation Template",
            }),
            template_edit: json!({
                "name": "Updated Automation Template",
                "description": "Updated template description",
            }),
            credential: json!({
                "name": "Automation Recipient",
                "email": "automation@example.com",
            }),
            credential_edit: json!({
                "name": "Updated Automation Recipient",
            }),
            copy_template: None,
            include_analytics: true,
        }
    }
}
