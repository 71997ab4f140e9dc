/// Account type definitions

use crate::account::plan::Plan;
use serde::{Deserialize, Serialize};

/// A user as known to this service; identity comes from the upstream gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub plan: Plan,
    pub created_at: String,
}

/// Tracked user actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    WorkflowGenerated,
    WorkflowExported,
    TemplateUsed,
    TemplateCustomized,
    ApiCall,
    WorkflowShared,
}

impl UsageAction {
    pub fn as_str(self) -> &'static str {
        match self {
            UsageAction::WorkflowGenerated => "workflow_generated",
            UsageAction::WorkflowExported => "workflow_exported",
            UsageAction::TemplateUsed => "template_used",
            UsageAction::TemplateCustomized => "template_customized",
            UsageAction::ApiCall => "api_call",
            UsageAction::WorkflowShared => "workflow_shared",
        }
    }
}
