//! Generic IR nodes as produced by the external parser.
//!
//! The parser emits a JSON array of objects, each tagged with a `type`
//! attribute. Until the `Compact` stage turns them into the typed AST,
//! nodes are kept in this open form.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, Location};

/// A tagged IR node with its open attribute map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Decodes the IR text of one source file.
pub fn decode_ir(text: &str, path: &Path) -> Result<Vec<Node>, CoreError> {
    let invalid = |reason: String| CoreError::InvalidIr {
        path: path.to_path_buf(),
        reason,
    };
    let value: Value = serde_json::from_str(text).map_err(|err| invalid(err.to_string()))?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(|err| invalid(err.to_string())),
        Value::Null => Err(invalid("parser produced no AST".to_string())),
        _ => Err(invalid("top level is not a list of nodes".to_string())),
    }
}

/// Normalizes a node kind into its handler key: `array-access` and
/// `array_access` both become `ArrayAccess`.
pub fn handler_key(kind: &str) -> String {
    kind.split(['-', '_'])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.trim().chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Node {
            kind: kind.into(),
            attributes: Map::new(),
        }
    }

    /// Builder used by tests and by phases that synthesize nodes.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn handler_key(&self) -> String {
        handler_key(&self.kind)
    }

    pub fn location(&self) -> Location {
        let number = |name: &str| {
            self.attributes.get(name).and_then(|value| match value {
                Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
        };
        Location {
            file: self
                .attributes
                .get("file")
                .and_then(Value::as_str)
                .map(str::to_string),
            line: number("line"),
            column: number("char"),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        matches!(self.attributes.get(name), Some(value) if !value.is_null())
    }

    pub fn malformed(&self, attribute: &str) -> CoreError {
        CoreError::MalformedNode {
            kind: self.kind.clone(),
            attribute: attribute.to_string(),
            location: self.location(),
        }
    }

    pub fn str_attr(&self, name: &str) -> Result<&str, CoreError> {
        self.opt_str_attr(name)?.ok_or_else(|| self.malformed(name))
    }

    pub fn opt_str_attr(&self, name: &str) -> Result<Option<&str>, CoreError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.malformed(name)),
        }
    }

    /// Scalar attribute rendered as text. The parser is inconsistent about
    /// quoting numbers, so both strings and numbers are accepted.
    pub fn scalar_attr(&self, name: &str) -> Result<String, CoreError> {
        match self.attributes.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            _ => Err(self.malformed(name)),
        }
    }

    pub fn bool_attr(&self, name: &str) -> Result<bool, CoreError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Number(n)) => Ok(n.as_i64().is_some_and(|n| n != 0)),
            Some(Value::String(s)) => match s.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                _ => Err(self.malformed(name)),
            },
            Some(_) => Err(self.malformed(name)),
        }
    }

    pub fn node_attr(&self, name: &str) -> Result<Node, CoreError> {
        self.opt_node_attr(name)?.ok_or_else(|| self.malformed(name))
    }

    pub fn opt_node_attr(&self, name: &str) -> Result<Option<Node>, CoreError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|_| self.malformed(name)),
            Some(_) => Err(self.malformed(name)),
        }
    }

    pub fn nodes_attr(&self, name: &str) -> Result<Vec<Node>, CoreError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value @ Value::Array(_)) => {
                serde_json::from_value(value.clone()).map_err(|_| self.malformed(name))
            }
            Some(_) => Err(self.malformed(name)),
        }
    }

    /// Untagged objects such as `{"variable": "a", "expr": {...}}` entries of
    /// `declare` or `let`. They are wrapped in a node of the given kind so the
    /// same accessors apply.
    pub fn records_attr(&self, name: &str, kind: &str) -> Result<Vec<Node>, CoreError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => {
                        let mut attributes = map.clone();
                        attributes.remove("type");
                        Ok(Node {
                            kind: kind.to_string(),
                            attributes,
                        })
                    }
                    _ => Err(self.malformed(name)),
                })
                .collect(),
            Some(_) => Err(self.malformed(name)),
        }
    }

    pub fn record_attr(&self, name: &str, kind: &str) -> Result<Option<Node>, CoreError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => {
                let mut attributes = map.clone();
                attributes.remove("type");
                Ok(Some(Node {
                    kind: kind.to_string(),
                    attributes,
                }))
            }
            Some(_) => Err(self.malformed(name)),
        }
    }

    /// List of plain strings, e.g. `visibility`.
    pub fn strings_attr(&self, name: &str) -> Result<Vec<String>, CoreError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.malformed(name))
                })
                .collect(),
            Some(_) => Err(self.malformed(name)),
        }
    }
}
