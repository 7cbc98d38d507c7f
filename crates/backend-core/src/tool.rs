//! Tool Vocabulary
//!
//! Tool schemas consumed at backend construction, plus the call/result pair
//! exchanged with the orchestration loop. Tool execution itself lives
//! outside this crate.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID, unique within a conversation
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Build the result message payload answering this call
    pub fn result(&self, result: Value) -> ToolResult {
        ToolResult {
            id: self.id.clone(),
            name: self.name.clone(),
            result,
        }
    }
}

/// Result from tool execution, fed back as an observation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the call this answers
    pub id: String,

    /// Tool that was called
    pub name: String,

    /// Structured tool output
    pub result: Value,
}

impl ToolResult {
    pub fn new(id: impl Into<String>, name: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            result,
        }
    }

    /// Serialized form of the result: strings pass through, everything else is JSON
    pub fn serialized(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Name and result together, for dialects whose result shape has no name field
    pub fn named_payload(&self) -> String {
        json!({ "name": self.name, "result": self.result }).to_string()
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// JSON Schema type (string, number, integer, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions keyed by name
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,

    /// Names of required parameters
    #[serde(default)]
    pub required: BTreeSet<String>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
            required: BTreeSet::new(),
        }
    }

    /// Add an optional parameter
    pub fn param(
        mut self,
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.insert(
            name.into(),
            ParameterSpec {
                param_type: param_type.into(),
                description: description.into(),
            },
        );
        self
    }

    /// Add a required parameter
    pub fn required_param(
        self,
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let mut spec = self.param(name.clone(), param_type, description);
        spec.required.insert(name);
        spec
    }

    /// JSON Schema object describing the parameters.
    ///
    /// Every provider dialect starts from this shape; `required` is emitted
    /// in sorted order so the output is stable.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(name, p)| {
                (
                    name.clone(),
                    json!({ "type": p.param_type, "description": p.description }),
                )
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required.iter().collect::<Vec<_>>(),
        })
    }
}
