/// HTTP API Layer
///
/// REST endpoints for workflow generation, retrieval, the template catalog, and
/// user plans. Every response uses the `{ success, data, error }` envelope.

// Envelope, error mapping, and caller identity
pub mod response;

// Generation and stored workflow endpoints
pub mod workflows;

// Template catalog endpoints
pub mod templates;

// Plan and usage endpoints
pub mod users;

pub use response::{ApiError, ApiResponse, CurrentUser};
pub use templates::create_template_routes;
pub use users::create_user_routes;
pub use workflows::{create_workflow_routes, AppState};
