/// Workflow Generation Layer
///
/// Everything between a user's description and a parsed workflow document:
/// - Prompt shaping from the request
/// - The provider boundary (OpenAI-compatible chat completions)
/// - Reply parsing and top-level field backfill

pub mod error;
pub mod generator;
pub mod provider;
pub mod request;

pub use error::GenerationError;
pub use generator::WorkflowGenerator;
pub use provider::{CompletionOptions, CompletionProvider, OpenAiProvider};
pub use request::{shape_prompts, Complexity, GenerationRequest, PromptPair};
