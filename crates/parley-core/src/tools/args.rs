//! Typed tool arguments
//!
//! The model hands tools a raw JSON string. `TypedTool` lets a tool declare
//! the shape it expects; the blanket `Tool` impl checks the payload against
//! the tool's own parameter schema, decodes it, and turns any problem into a
//! result string the model can read and correct.

use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::Tool;
use crate::errors::AgentError;

/// Prefix of every argument-decoding failure reported back to the model.
pub const ARGUMENT_ERROR_PREFIX: &str = "failed to parse tool call arguments: ";

#[async_trait]
pub trait TypedTool: Send + Sync {
    type Args: DeserializeOwned + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn parameters_schema(&self) -> Value;

    async fn call(&self, args: Self::Args) -> Result<String, AgentError>;
}

/// Arguments of a tool that takes none. Extra keys are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NoArgs {}

/// Parses, validates against `schema`, and decodes a raw argument payload.
///
/// An empty payload is read as `{}`.
pub fn decode_arguments<A: DeserializeOwned>(schema: &Value, raw: &str) -> Result<A, String> {
    let raw = raw.trim();
    let value: Value = if raw.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(raw).map_err(|e| e.to_string())?
    };

    let compiled = JSONSchema::compile(schema).map_err(|e| format!("invalid tool schema: {}", e))?;
    if let Err(errors) = compiled.validate(&value) {
        let messages: Vec<String> = errors
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("at '{}': {}", path, error)
                }
            })
            .collect();
        return Err(messages.join("; "));
    }

    serde_json::from_value(value).map_err(|e| e.to_string())
}

#[async_trait]
impl<T> Tool for T
where
    T: TypedTool,
{
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn parameters(&self) -> Value {
        self.parameters_schema()
    }

    async fn execute(&self, arguments: &str) -> Result<String, AgentError> {
        let args = match decode_arguments::<T::Args>(&self.parameters_schema(), arguments) {
            Ok(args) => args,
            Err(detail) => {
                log::warn!("Rejected arguments for tool '{}': {}", T::NAME, detail);
                return Ok(format!("{}{}", ARGUMENT_ERROR_PREFIX, detail));
            }
        };
        self.call(args).await
    }
}
