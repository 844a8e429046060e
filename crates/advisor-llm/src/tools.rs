//! Tool definitions offered to the model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable tool as described to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    /// Tells the model when the tool is useful
    pub description: String,
    /// JSON schema of the tool input
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// JSON schema helpers for tool inputs
pub mod schema {
    use serde_json::{Value, json};

    /// Object schema with the given properties and required keys
    ///
    /// ```
    /// use advisor_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let input = schema::object(
    ///     json!({ "company": schema::string("Company name") }),
    ///     &["company"],
    /// );
    /// assert_eq!(input["required"][0], "company");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }
}
