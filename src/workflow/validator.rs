/// Structural validation for generated workflow documents
///
/// Checks only what n8n's importer needs to accept a document: a non-empty node
/// list, well-formed node headers, and connections that point at real nodes.
/// Node semantics (whether a `type` exists, whether parameters make sense) are
/// not inspected.

use crate::workflow::types::WorkflowDocument;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Why a document was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NotAnObject,
    MissingNodes,
    EmptyNodes,
    /// Node at this position is not an object
    MalformedNode(usize),
    /// Node at this position lacks a non-empty string field
    MissingNodeField { index: usize, field: &'static str },
    BadPosition(usize),
    BadParameters(usize),
    MissingConnections,
    /// Connection key names no node
    UnknownSource(String),
    /// Connection entry or its `main` list has the wrong shape
    MalformedConnection(String),
    /// Fan-out target names no node
    UnknownTarget { source: String, target: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "document is not a JSON object"),
            Self::MissingNodes => write!(f, "`nodes` is missing or not an array"),
            Self::EmptyNodes => write!(f, "`nodes` is empty"),
            Self::MalformedNode(i) => write!(f, "node #{i} is not an object"),
            Self::MissingNodeField { index, field } => {
                write!(f, "node #{index} has no `{field}`")
            }
            Self::BadPosition(i) => write!(f, "node #{i} `position` is not an [x, y] pair"),
            Self::BadParameters(i) => write!(f, "node #{i} `parameters` is not an object"),
            Self::MissingConnections => write!(f, "`connections` is missing or not an object"),
            Self::UnknownSource(id) => write!(f, "connections reference unknown source node '{id}'"),
            Self::MalformedConnection(id) => write!(f, "connections of '{id}' are malformed"),
            Self::UnknownTarget { source, target } => {
                write!(f, "'{source}' connects to unknown node '{target}'")
            }
        }
    }
}

/// Returns true iff the document satisfies every structural rule
///
/// A `false` means "reject this document", never "the validator failed".
pub fn validate(document: &Value) -> bool {
    accepted(check(document))
}

/// [`validate`] for an already wrapped document
pub fn validate_document(document: &WorkflowDocument) -> bool {
    accepted(check_document(document))
}

/// Same rules as [`validate`], reporting the first violation found
pub fn check(document: &Value) -> Result<(), ValidationIssue> {
    let document = document.as_object().ok_or(ValidationIssue::NotAnObject)?;
    check_fields(document)
}

/// [`check`] for an already wrapped document
pub fn check_document(document: &WorkflowDocument) -> Result<(), ValidationIssue> {
    check_fields(document.fields())
}

fn accepted(outcome: Result<(), ValidationIssue>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(issue) => {
            tracing::debug!("🔍 Workflow rejected by validator: {}", issue);
            false
        }
    }
}

fn check_fields(document: &Map<String, Value>) -> Result<(), ValidationIssue> {
    let nodes = document
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(ValidationIssue::MissingNodes)?;
    if nodes.is_empty() {
        return Err(ValidationIssue::EmptyNodes);
    }

    let mut node_ids = HashSet::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        let node = node.as_object().ok_or(ValidationIssue::MalformedNode(index))?;
        for field in ["id", "name", "type"] {
            if non_empty_str(node, field).is_none() {
                return Err(ValidationIssue::MissingNodeField { index, field });
            }
        }
        if !is_coordinate(node.get("position")) {
            return Err(ValidationIssue::BadPosition(index));
        }
        if !node.get("parameters").is_some_and(Value::is_object) {
            return Err(ValidationIssue::BadParameters(index));
        }
        if let Some(id) = non_empty_str(node, "id") {
            node_ids.insert(id);
        }
    }

    let connections = document
        .get("connections")
        .and_then(Value::as_object)
        .ok_or(ValidationIssue::MissingConnections)?;

    for (source, entry) in connections {
        if !node_ids.contains(source.as_str()) {
            return Err(ValidationIssue::UnknownSource(source.clone()));
        }
        let entry = entry
            .as_object()
            .ok_or_else(|| ValidationIssue::MalformedConnection(source.clone()))?;
        // null `main` counts as no outgoing connections
        let Some(main) = entry.get("main").filter(|main| !main.is_null()) else {
            continue;
        };
        let groups = main
            .as_array()
            .ok_or_else(|| ValidationIssue::MalformedConnection(source.clone()))?;
        for group in groups {
            let targets = group
                .as_array()
                .ok_or_else(|| ValidationIssue::MalformedConnection(source.clone()))?;
            for target in targets {
                let target_id = target
                    .as_object()
                    .and_then(|t| non_empty_str(t, "node"))
                    .ok_or_else(|| ValidationIssue::MalformedConnection(source.clone()))?;
                if !node_ids.contains(target_id) {
                    return Err(ValidationIssue::UnknownTarget {
                        source: source.clone(),
                        target: target_id.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn is_coordinate(position: Option<&Value>) -> bool {
    matches!(
        position.and_then(Value::as_array).map(Vec::as_slice),
        Some([x, y]) if x.is_number() && y.is_number()
    )
}
