/// Flowsmith: natural-language to n8n workflow generation
///
/// Shapes a user's description into a model prompt, asks an OpenAI-compatible
/// endpoint for an n8n workflow, validates the reply structurally, and stores it
/// for browsing and download.

// Core configuration and setup
pub mod config;

// SQLite connection and schema
pub mod database;

// Users, plans, and usage logging
pub mod account;

// Workflow document types, structural validator, and persistence
pub mod workflow;

// Prompt shaping, provider boundary, reply parsing and backfill
pub mod generation;

// Starter template catalog
pub mod template;

// HTTP API layer - generation, download, catalog, and plan endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use generation::{GenerationError, GenerationRequest, WorkflowGenerator};
pub use server::start_server;
pub use workflow::{validate, WorkflowDocument};
