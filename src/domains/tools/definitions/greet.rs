//! Greet tool definition.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Content};
use tracing::{info, instrument};

use super::ToolDefinition;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::metadata::ToolMetadata;
use crate::domains::tools::schema::{ParamRule, ParameterSchema, ToolParams};

/// Greeting styles accepted by the `style` parameter.
const STYLES: [&str; 3] = ["formal", "casual", "enthusiastic"];

/// Greet tool - builds a greeting for a user.
pub struct GreetTool;

impl GreetTool {
    pub const NAME: &'static str = "greet";
    pub const DESCRIPTION: &'static str =
        "Greet a user by name in a formal, casual, or enthusiastic style.";

    fn render(name: &str, style: &str) -> String {
        match style {
            "formal" => format!("Good day, {}. It is a pleasure to meet you.", name),
            "enthusiastic" => format!("Hey {}!!! So great to see you!", name),
            _ => format!("Hello, {}!", name),
        }
    }
}

#[async_trait]
impl ToolDefinition for GreetTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(Self::NAME, Self::DESCRIPTION)
            .title("Greet the user")
            .read_only()
            .idempotent()
    }

    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .param(
                "name",
                ParamRule::string("The name of the user to greet").min_length(1),
            )
            .param(
                "style",
                ParamRule::string("The greeting style: formal, casual, or enthusiastic")
                    .one_of(STYLES)
                    .with_default("casual"),
            )
    }

    #[instrument(skip_all)]
    async fn call(&self, params: ToolParams) -> Result<CallToolResult, ToolError> {
        let name: String = params.get("name")?;
        let style: String = params.get("style")?;

        info!("Greet tool called for '{}' ({})", name, style);

        Ok(CallToolResult::success(vec![Content::text(Self::render(
            &name, &style,
        ))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => text.text.clone(),
            _ => panic!("Expected text content"),
        }
    }

    #[tokio::test]
    async fn test_greet_default_style() {
        let params = GreetTool
            .schema()
            .validate(json!({"name": "Ada"}).as_object())
            .unwrap();
        let result = GreetTool.call(params).await.unwrap();
        assert_eq!(text_of(&result), "Hello, Ada!");
    }

    #[tokio::test]
    async fn test_greet_formal() {
        let params = GreetTool
            .schema()
            .validate(json!({"name": "Ada", "style": "formal"}).as_object())
            .unwrap();
        let result = GreetTool.call(params).await.unwrap();
        assert!(text_of(&result).starts_with("Good day, Ada."));
    }

    #[test]
    fn test_greet_rejects_unknown_style_and_empty_name() {
        let err = GreetTool
            .schema()
            .validate(json!({"name": "", "style": "rude"}).as_object())
            .unwrap_err();
        assert_eq!(err.for_parameter("name").unwrap().rule, "min_length");
        assert_eq!(err.for_parameter("style").unwrap().rule, "one_of");
    }
}
