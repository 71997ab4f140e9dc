/// Subscription plans and their limits

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Business,
    Enterprise,
}

/// What a plan allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    /// `None` means unlimited
    pub workflows_per_month: Option<u32>,
    pub templates_access: bool,
    pub priority_support: bool,
    pub api_access: bool,
    pub custom_templates: bool,
}

impl Plan {
    pub fn limits(self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                workflows_per_month: Some(3),
                templates_access: false,
                priority_support: false,
                api_access: false,
                custom_templates: false,
            },
            Plan::Pro => PlanLimits {
                workflows_per_month: Some(50),
                templates_access: true,
                priority_support: false,
                api_access: false,
                custom_templates: true,
            },
            Plan::Business | Plan::Enterprise => PlanLimits {
                workflows_per_month: None,
                templates_access: true,
                priority_support: true,
                api_access: true,
                custom_templates: true,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Business => "business",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl PlanLimits {
    /// Whether one more workflow fits after `used` this month
    pub fn allows_another(&self, used: i64) -> bool {
        match self.workflows_per_month {
            Some(limit) => used < i64::from(limit),
            None => true,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "business" => Ok(Plan::Business),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(anyhow::anyhow!("Unknown plan: {}", other)),
        }
    }
}
