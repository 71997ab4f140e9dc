/// Generation request and prompt shaping
///
/// Turns a user's free-text description plus optional metadata into the system and
/// user prompts sent to the model. Pure: same input, same prompts.

use crate::generation::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inbound generation request, as posted by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// What the automation should do, in the user's words
    pub description: String,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub requirements: Option<Vec<String>>,
}

/// Requested workflow size/sophistication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two text blocks of one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    /// Fixed instruction context
    pub system: String,
    /// Task context built from the request
    pub user: String,
}

const SYSTEM_PROMPT: &str = "You are an expert n8n workflow designer. Generate a complete, functional n8n workflow JSON based on user requirements.

Key guidelines:
- Create realistic, production-ready workflows
- Use appropriate n8n nodes for the task
- Ensure proper node connections and data flow
- Include error handling where applicable
- Use realistic node parameters and configurations
- Follow n8n best practices for workflow design

Available common n8n nodes:
- HTTP Request: For API calls
- Code: For custom JavaScript/Python logic
- If: For conditional logic
- Set: For data manipulation
- Wait: For delays
- Schedule Trigger: For time-based triggers
- Webhook: For HTTP triggers
- Gmail: For email operations
- Slack: For Slack integration
- Google Sheets: For spreadsheet operations
- Notion: For Notion database operations
- Airtable: For Airtable operations
- And many more...

Response format: Return ONLY a valid JSON object representing the n8n workflow.";

const TASK_CHECKLIST: &str = "Generate a complete n8n workflow JSON with:
1. Appropriate trigger node
2. Processing nodes with realistic configurations
3. Proper node connections
4. Error handling if needed
5. Output/action nodes

Make it production-ready and functional.";

impl GenerationRequest {
    /// Description with surrounding whitespace removed
    pub fn trimmed_description(&self) -> &str {
        self.description.trim()
    }

    /// Complexity used in the prompt when the client sent none
    pub fn effective_complexity(&self) -> Complexity {
        self.complexity.unwrap_or_default()
    }
}

/// Build the prompt pair for a request
///
/// Fails with `InvalidRequest` when the description is empty after trimming.
pub fn shape_prompts(request: &GenerationRequest) -> Result<PromptPair, GenerationError> {
    let description = request.trimmed_description();
    if description.is_empty() {
        return Err(GenerationError::InvalidRequest(
            "Workflow description is required".to_string(),
        ));
    }

    let mut lines = vec![
        format!("Create an n8n workflow for: {}", description),
        String::new(),
        format!("Complexity: {}", request.effective_complexity()),
    ];

    if let Some(category) = request.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        lines.push(format!("Category: {}", category));
    }

    let requirements: Vec<&str> = request
        .requirements
        .iter()
        .flatten()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();
    if !requirements.is_empty() {
        lines.push(format!("Additional requirements: {}", requirements.join(", ")));
    }

    lines.push(String::new());
    lines.push(TASK_CHECKLIST.to_string());

    Ok(PromptPair {
        system: SYSTEM_PROMPT.to_string(),
        user: lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(description: &str) -> GenerationRequest {
        GenerationRequest {
            description: description.to_string(),
            complexity: None,
            category: None,
            requirements: None,
        }
    }

    #[test]
    fn whitespace_description_is_rejected() {
        for description in ["", "   ", "\n\t "] {
            let err = shape_prompts(&request(description)).unwrap_err();
            assert!(matches!(err, GenerationError::InvalidRequest(_)));
        }
    }

    #[test]
    fn defaults_to_medium_and_omits_absent_lines() {
        let prompts = shape_prompts(&request("  send a slack message every morning ")).unwrap();
        assert!(prompts
            .user
            .starts_with("Create an n8n workflow for: send a slack message every morning\n"));
        assert!(prompts.user.contains("Complexity: medium"));
        assert!(!prompts.user.contains("Category:"));
        assert!(!prompts.user.contains("Additional requirements:"));
        assert!(prompts.user.ends_with("Make it production-ready and functional."));
        assert!(prompts.system.contains("Return ONLY a valid JSON object"));
    }

    #[test]
    fn interpolates_metadata() {
        let req = GenerationRequest {
            description: "sync sheets to airtable".to_string(),
            complexity: Some(Complexity::Complex),
            category: Some("operations".to_string()),
            requirements: Some(vec!["retry on failure".into(), " ".into(), "log errors".into()]),
        };
        let prompts = shape_prompts(&req).unwrap();
        assert!(prompts.user.contains("Complexity: complex"));
        assert!(prompts.user.contains("Category: operations"));
        assert!(prompts
            .user
            .contains("Additional requirements: retry on failure, log errors"));
    }

    #[test]
    fn shaping_is_pure() {
        let req = request("watch a webhook");
        assert_eq!(shape_prompts(&req).unwrap(), shape_prompts(&req).unwrap());
    }

    #[test]
    fn complexity_parses_lowercase() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{"description":"x","complexity":"simple"}"#).unwrap();
        assert_eq!(req.complexity, Some(Complexity::Simple));
        assert!(serde_json::from_str::<GenerationRequest>(
            r#"{"description":"x","complexity":"huge"}"#
        )
        .is_err());
    }
}
