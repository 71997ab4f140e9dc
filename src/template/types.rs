/// Template type definitions

use crate::workflow::types::{ConnectionTarget, Connections, Node, NodeConnections, WorkflowDocument};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fmt;
use std::str::FromStr;

/// Template categories shown in the catalog filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateCategory {
    Marketing,
    Sales,
    Operations,
    Finance,
    Hr,
    Development,
    Ecommerce,
    SocialMedia,
    DataProcessing,
    Communication,
    Other,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 11] = [
        Self::Marketing,
        Self::Sales,
        Self::Operations,
        Self::Finance,
        Self::Hr,
        Self::Development,
        Self::Ecommerce,
        Self::SocialMedia,
        Self::DataProcessing,
        Self::Communication,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Marketing => "marketing",
            Self::Sales => "sales",
            Self::Operations => "operations",
            Self::Finance => "finance",
            Self::Hr => "hr",
            Self::Development => "development",
            Self::Ecommerce => "ecommerce",
            Self::SocialMedia => "social-media",
            Self::DataProcessing => "data-processing",
            Self::Communication => "communication",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown template category: {}", s))
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: TemplateCategory,
    pub is_premium: bool,
    pub usage_count: i64,
    pub node_count: u32,
    pub tags: Vec<String>,
}

impl Template {
    /// Case-insensitive match against title, description, or any tag
    ///
    /// `needle` must already be lowercase.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }

    /// Skeleton n8n document for this template
    ///
    /// Nodes are laid out left to right: a trigger, processing steps, and a final
    /// action, chained in order through `main`.
    pub fn skeleton(&self) -> serde_json::Result<WorkflowDocument> {
        let count = self.node_count as usize;
        let nodes: Vec<Node> = (0..count)
            .map(|i| Node {
                id: format!("node_{}", i),
                name: format!("Node {}", i + 1),
                node_type: if i == 0 {
                    "Trigger"
                } else if i == count - 1 {
                    "Action"
                } else {
                    "Process"
                }
                .to_string(),
                type_version: 1,
                position: [(i * 200) as f64, 100.0],
                parameters: Map::new(),
                credentials: None,
                webhook: None,
            })
            .collect();

        let connections: Connections = nodes
            .windows(2)
            .map(|pair| {
                (
                    pair[0].id.clone(),
                    NodeConnections {
                        main: Some(vec![vec![ConnectionTarget {
                            node: pair[1].id.clone(),
                            channel: "main".to_string(),
                            index: 0,
                        }]]),
                    },
                )
            })
            .collect();

        WorkflowDocument::assemble(Some(self.id.clone()), &self.title, &nodes, &connections, false)
    }
}
