/// Workflow generator
///
/// Runs one generation call end to end: shape prompts, ask the provider, parse the
/// reply, and fill in the top-level fields n8n needs but models often forget.
/// Structural validation is left to the caller (`workflow::validator`).

use crate::generation::{
    error::GenerationError,
    provider::{CompletionOptions, CompletionProvider},
    request::{shape_prompts, GenerationRequest},
};
use crate::workflow::types::WorkflowDocument;
use serde_json::Value;
use std::sync::Arc;

/// Number of description words used for a backfilled name
const NAME_WORDS: usize = 4;

/// Length of the random part of a backfilled id
const ID_TOKEN_LEN: usize = 9;

/// Stateless generation service; cheap to share behind an `Arc`
pub struct WorkflowGenerator {
    provider: Arc<dyn CompletionProvider>,
    options: CompletionOptions,
}

impl std::fmt::Debug for WorkflowGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowGenerator")
            .field("provider", &self.provider.name())
            .field("options", &self.options)
            .finish()
    }
}

impl WorkflowGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, options: CompletionOptions) -> Self {
        Self { provider, options }
    }

    /// Generate a workflow document for the request
    ///
    /// The call is awaited to completion; callers impose their own deadline.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<WorkflowDocument, GenerationError> {
        let prompts = shape_prompts(request)?;

        tracing::info!(
            "🤖 Requesting workflow from provider '{}' (complexity: {})",
            self.provider.name(),
            request.effective_complexity()
        );
        let start_time = std::time::Instant::now();

        let content = self
            .provider
            .complete(&prompts, &self.options)
            .await
            .inspect_err(|e| tracing::error!("❌ Provider call failed: {}", e))?
            .ok_or(GenerationError::GenerationEmpty)?;

        tracing::debug!("📥 Provider replied in {:?}", start_time.elapsed());

        let mut document = parse_reply(&content)?;
        backfill(&mut document, request.trimmed_description());

        tracing::info!(
            "✅ Generated workflow '{}' with {} nodes",
            document.name().unwrap_or_default(),
            document.node_count()
        );

        Ok(document)
    }
}

/// Parse the provider reply into a document
///
/// The reply must be a JSON object carrying both `nodes` and `connections`.
pub fn parse_reply(content: &str) -> Result<WorkflowDocument, GenerationError> {
    if content.trim().is_empty() {
        return Err(GenerationError::GenerationEmpty);
    }

    let value: Value = serde_json::from_str(content)
        .map_err(|e| GenerationError::GenerationMalformed(format!("reply is not JSON: {}", e)))?;

    let Value::Object(fields) = value else {
        return Err(GenerationError::GenerationMalformed(
            "reply is not a JSON object".to_string(),
        ));
    };

    if is_blank(fields.get("nodes")) || is_blank(fields.get("connections")) {
        return Err(GenerationError::GenerationMalformed(
            "reply lacks nodes or connections".to_string(),
        ));
    }

    Ok(WorkflowDocument::from_map(fields))
}

/// Fill `id`, `name`, and `active` when the model left them out
///
/// `id` and `name` are replaced when missing, null, or empty; `active` only when
/// missing or null.
pub fn backfill(document: &mut WorkflowDocument, description: &str) {
    let fields = document.fields_mut();

    if is_falsy(fields.get("id")) {
        fields.insert("id".to_string(), Value::String(generate_workflow_id()));
    }
    if is_falsy(fields.get("name")) {
        fields.insert("name".to_string(), Value::String(workflow_name_from(description)));
    }
    if is_blank(fields.get("active")) {
        fields.insert("active".to_string(), Value::Bool(false));
    }
}

/// `workflow_<unix millis>_<random token>`
pub fn generate_workflow_id() -> String {
    let token: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ID_TOKEN_LEN)
        .collect();
    format!("workflow_{}_{}", chrono::Utc::now().timestamp_millis(), token)
}

/// First four words of the description, each with an upper-cased first letter
pub fn workflow_name_from(description: &str) -> String {
    description
        .split_whitespace()
        .take(NAME_WORDS)
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        _ => false,
    }
}
