/// Template Catalog
///
/// Ready-made workflow starters users can browse and download:
/// - Type definitions (Template, TemplateCategory)
/// - SQLite persistence with a seeded starter set
/// - Lock-free search snapshot using ArcSwap

pub mod registry;
pub mod storage;
pub mod types;

pub use registry::TemplateRegistry;
pub use storage::TemplateStorage;
pub use types::{Template, TemplateCategory};
