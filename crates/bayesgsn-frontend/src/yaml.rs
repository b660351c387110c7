//! gsn2x YAML parsing.
//!
//! A document is a mapping from node label to node record:
//!
//! ```yaml
//! G1:
//!   text: The system is acceptably safe
//!   supportedBy: [S1]
//!   inContextOf: [C1]
//! Sn1:
//!   text: Test report
//!   belief: 0.9
//! ```
//!
//! The element type comes from the label prefix (`G`, `S`, `Sn`, `C`, `J`,
//! `A`). Unknown record fields are ignored so gsn2x layout hints can stay in
//! the file.

use std::path::Path;

use bayesgsn_core::{GsnElement, GsnTree, GsnType};
use serde::Deserialize;
use serde_yaml::Value;

use crate::errors::FrontendError;

#[derive(Debug, Deserialize)]
struct NodeRecord {
    text: Option<String>,
    #[serde(rename = "supportedBy")]
    supported_by: Option<Vec<String>>,
    #[serde(rename = "inContextOf")]
    in_context_of: Option<Vec<String>>,
    belief: Option<f64>,
}

/// Parses a YAML document into elements, in file order.
pub fn parse_gsn_yaml(source: &str) -> Result<Vec<GsnElement>, FrontendError> {
    let document: Value =
        serde_yaml::from_str(source).map_err(|e| FrontendError::ParseError(e.to_string()))?;
    let mapping = match document {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(FrontendError::ValidationError(format!(
                "expected a mapping of node labels at the top level, found {}",
                value_kind(&other)
            )))
        }
    };

    let mut elements = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let label = match key {
            Value::String(label) => label,
            other => {
                return Err(FrontendError::ValidationError(format!(
                    "node labels must be strings, found {}",
                    value_kind(&other)
                )))
            }
        };
        elements.push(parse_node(label, value)?);
    }
    Ok(elements)
}

fn parse_node(label: String, value: Value) -> Result<GsnElement, FrontendError> {
    let element_type = GsnType::from_label_prefix(&label).ok_or_else(|| {
        let prefix: String = label.chars().take(2).collect();
        FrontendError::ValidationError(format!(
            "node '{}' uses an undefined prefix '{}'",
            label, prefix
        ))
    })?;
    let record: NodeRecord = serde_yaml::from_value(value).map_err(|e| {
        FrontendError::ValidationError(format!("node '{}': {}", label, e))
    })?;
    let text = record.text.ok_or_else(|| {
        FrontendError::ValidationError(format!("node '{}' has no 'text' field", label))
    })?;

    let mut element = GsnElement::new(label, text, element_type)
        .with_supporters(record.supported_by.unwrap_or_default())
        .with_contexts(record.in_context_of.unwrap_or_default());
    if let Some(belief) = record.belief {
        element = element.with_belief(belief);
    }
    Ok(element)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Parses `source` and builds a validated tree named `name`.
pub fn load_tree(name: &str, source: &str) -> Result<GsnTree, FrontendError> {
    let elements = parse_gsn_yaml(source)?;
    Ok(GsnTree::build(name, elements)?)
}

/// Reads and loads a YAML file.
pub fn load_tree_file(name: &str, path: impl AsRef<Path>) -> Result<GsnTree, FrontendError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| FrontendError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_tree(name, &source)
}
