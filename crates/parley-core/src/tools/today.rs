//! Current date and time tool.

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use serde_json::{json, Value};

use super::args::{NoArgs, TypedTool};
use crate::errors::AgentError;

pub struct TodayTool;

impl TodayTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TodayTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TypedTool for TodayTool {
    type Args = NoArgs;

    const NAME: &'static str = "get_today_date";
    const DESCRIPTION: &'static str = "Get the current date and time in RFC3339 format.";

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn call(&self, _args: NoArgs) -> Result<String, AgentError> {
        Ok(Local::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
