//! Tool system for LLM interactions
//!
//! Tools are host-defined functions the model may ask to run. Each one
//! declares an argument schema; the mediator validates untrusted model
//! output against it before the handler is ever called.

mod email;
mod registry;
pub mod schema;
pub mod sql;
mod weather;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use email::SendEmailTool;
pub use registry::ToolRegistry;
pub use schema::{ArgValue, ArgumentSchema, FieldError, FieldErrorKind, FieldSpec, FieldType, ValidatedArgs};
pub use sql::{SqlCatalog, SqlOutcome, SqlStatement};
pub use weather::GetWeatherTool;

/// A tool that can be called by the LLM
pub trait Tool: Send + Sync {
    /// Tool name (matches the model's `tool_name`)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Declared arguments
    fn schema(&self) -> ArgumentSchema;

    /// Run the tool with arguments that already passed validation
    fn execute(&self, args: &ValidatedArgs) -> eyre::Result<String>;
}

/// Registration format of a tool: name, description and field declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub schema: BTreeMap<String, FieldSpec>,
}

impl ToolSpec {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            schema: (&tool.schema()).into(),
        }
    }

    pub fn argument_schema(&self) -> ArgumentSchema {
        self.schema.clone().into()
    }

    /// Render in the `{name, description, parameters}` shape models are prompted with
    pub fn to_prompt_schema(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.argument_schema().to_json_schema(),
        })
    }
}

/// Keys accepted as the argument object of a tool call
const INPUT_KEYS: [&str; 2] = ["tool_input", "parameters"];

/// An untrusted tool call request pulled out of model output
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub tool_input: Value,
}

impl ToolCallRequest {
    /// Classify a parsed JSON object. Returns None when it is not a tool call.
    pub fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let input = INPUT_KEYS.iter().find_map(|k| object.get(*k));
        let name = object.get("tool_name");
        if name.is_none() && input.is_none() {
            return None;
        }

        let tool_name = name?.as_str()?.to_string();
        let tool_input = match input {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(v) => v.clone(),
        };

        Some(Self { tool_name, tool_input })
    }
}
