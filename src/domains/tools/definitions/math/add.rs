//! Add tool definition.
//!
//! Adds two numbers and returns the sum as text.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Content};
use tracing::{info, instrument};

use crate::domains::tools::definitions::ToolDefinition;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::metadata::ToolMetadata;
use crate::domains::tools::schema::{ParamRule, ParameterSchema, ToolParams};

/// Add tool - sums two numbers.
pub struct AddTool;

impl AddTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "add";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Add two numbers together and return the sum.";
}

#[async_trait]
impl ToolDefinition for AddTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(Self::NAME, Self::DESCRIPTION)
            .title("Add Numbers")
            .read_only()
            .idempotent()
    }

    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .param("a", ParamRule::number("First number to add"))
            .param("b", ParamRule::number("Second number to add"))
    }

    #[instrument(skip_all)]
    async fn call(&self, params: ToolParams) -> Result<CallToolResult, ToolError> {
        let a: f64 = params.get("a")?;
        let b: f64 = params.get("b")?;
        let sum = a + b;

        info!("Add tool called: {} + {} = {}", a, b, sum);

        Ok(CallToolResult::success(vec![Content::text(format_number(sum))]))
    }
}

/// Render a number the way JSON clients print them: integral values without a
/// fraction, exponent notation outside `1e-6..1e21`, and named non-finite
/// values.
fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }

    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    async fn run(args: serde_json::Value) -> CallToolResult {
        let params = AddTool.schema().validate(args.as_object()).unwrap();
        AddTool.call(params).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_integers() {
        let result = run(json!({"a": 2, "b": 3})).await;
        assert_eq!(text_of(&result), "5");
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_add_fractions() {
        let result = run(json!({"a": 0.5, "b": 0.25})).await;
        assert_eq!(text_of(&result), "0.75");
    }

    #[tokio::test]
    async fn test_add_negative() {
        let result = run(json!({"a": -10, "b": 4})).await;
        assert_eq!(text_of(&result), "-6");
    }

    #[tokio::test]
    async fn test_add_overflow_is_infinity() {
        let result = run(json!({"a": 1e308, "b": 1e308})).await;
        assert_eq!(text_of(&result), "Infinity");

        let result = run(json!({"a": -1e308, "b": -1e308})).await;
        assert_eq!(text_of(&result), "-Infinity");
    }

    #[tokio::test]
    async fn test_add_large_and_tiny_use_exponents() {
        let result = run(json!({"a": 1e21, "b": 0})).await;
        assert_eq!(text_of(&result), "1e+21");

        let result = run(json!({"a": 1e-7, "b": 0})).await;
        assert_eq!(text_of(&result), "1e-7");

        let result = run(json!({"a": 123456789012345680000.0, "b": 0})).await;
        assert_eq!(text_of(&result), "123456789012345680000");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-1.5e-7), "-1.5e-7");
        assert_eq!(format_number(2.5e25), "2.5e+25");
        assert_eq!(format_number(0.000001), "0.000001");
    }

    #[test]
    fn test_add_metadata() {
        let meta = AddTool.metadata();
        assert_eq!(meta.name, "add");
        assert!(meta.hints.read_only);
        assert!(meta.hints.idempotent);
        assert!(!meta.hints.destructive);
        assert!(meta.validate().is_ok());

        let schema = AddTool.schema();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
