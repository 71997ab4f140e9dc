/// Account management module
///
/// Users, their subscription plans, and the usage log that backs quota checks
/// and analytics.

pub mod plan;
pub mod storage;
pub mod types;

pub use plan::{Plan, PlanLimits};
pub use storage::AccountStorage;
pub use types::{UsageAction, User};
