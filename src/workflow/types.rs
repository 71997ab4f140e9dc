/// Core workflow type definitions
///
/// Describes the n8n import format the generator produces. The document itself is
/// kept as an ordered JSON object so that whatever the model returns (including
/// fields this crate never looks at, like `settings` or `staticData`) survives
/// byte-for-byte into the downloaded artifact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A complete n8n workflow document
///
/// Wraps the top-level JSON object. Accessors read the well-known fields without
/// assuming they are well-formed; `validator::check` is what decides that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowDocument(Map<String, Value>);

impl WorkflowDocument {
    /// Wrap a parsed JSON object
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a document from typed parts, as the template catalog does
    pub fn assemble(
        id: Option<String>,
        name: &str,
        nodes: &[Node],
        connections: &Connections,
        active: bool,
    ) -> serde_json::Result<Self> {
        let mut fields = Map::new();
        if let Some(id) = id {
            fields.insert("id".to_string(), Value::String(id));
        }
        fields.insert("name".to_string(), Value::String(name.to_string()));
        fields.insert("nodes".to_string(), serde_json::to_value(nodes)?);
        fields.insert("connections".to_string(), serde_json::to_value(connections)?);
        fields.insert("active".to_string(), Value::Bool(active));
        Ok(Self(fields))
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn active(&self) -> Option<bool> {
        self.0.get("active").and_then(Value::as_bool)
    }

    /// Number of entries in `nodes`, 0 when absent or not an array
    pub fn node_count(&self) -> usize {
        self.0
            .get("nodes")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Raw access for in-place normalisation
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A single n8n node
///
/// Typed view used when this crate authors nodes itself. Field names follow the
/// n8n import format exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique node identifier within the workflow
    pub id: String,
    /// Display name shown in the n8n editor
    pub name: String,
    /// Integration/operation tag, e.g. "n8n-nodes-base.httpRequest"
    #[serde(rename = "type")]
    pub node_type: String,
    pub type_version: u32,
    /// Editor canvas coordinate, cosmetic only
    pub position: [f64; 2],
    /// Node configuration, may be empty
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Map<String, Value>>,
}

/// One fan-out target of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Target node id
    pub node: String,
    /// Input channel on the target, normally "main"
    #[serde(rename = "type")]
    pub channel: String,
    /// Input index on the target
    pub index: u32,
}

/// Outgoing connections of one source node, grouped by output channel
///
/// `main[output_index]` lists every target fed from that output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConnections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<Vec<Vec<ConnectionTarget>>>,
}

/// Source node id -> outgoing connections
pub type Connections = std::collections::BTreeMap<String, NodeConnections>;

/// Download file name: whitespace runs become `_`, lowercased, `.json` appended
pub fn download_file_name(title: &str) -> String {
    let stem = title.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase();
    let stem: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    if stem.is_empty() {
        "workflow.json".to_string()
    } else {
        format!("{}.json", stem)
    }
}

/// Unicode download file name, same shape as `download_file_name` but keeping
/// non-ASCII letters; path separators, quotes and control characters are dropped
pub fn unicode_download_file_name(title: &str) -> String {
    let stem: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | '"'))
        .collect();
    if stem.is_empty() {
        "workflow.json".to_string()
    } else {
        format!("{}.json", stem)
    }
}
