/// Workflow Document Layer
///
/// The n8n document this service produces and everything that inspects it:
/// - Type definitions (WorkflowDocument, Node, ConnectionTarget)
/// - Structural validator
/// - SQLite persistence for generated workflows

// n8n document type definitions
pub mod types;

// Structural validation of generated documents
pub mod validator;

// SQLite persistence for generated workflows
pub mod storage;

// Re-export commonly used types
pub use types::{ConnectionTarget, Node, NodeConnections, WorkflowDocument};
pub use validator::{check, validate, ValidationIssue};
