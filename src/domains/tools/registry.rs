//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - The explicit registration table of built-in tools
//! - Name validation and duplicate detection at startup
//! - The validate → invoke → shape cycle used by every transport

use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::config::Config;

use super::definitions::{AddTool, FsDeleteTool, FsListDirTool, GreetTool, ToolDefinition};
use super::error::ToolError;
use super::metadata::ToolMetadata;
use super::schema::{CompiledSchema, ParameterSchema};

// ============================================================================
// Registration table
// ============================================================================

/// All built-in tool definitions.
///
/// This is the single place where tools are registered. When adding a new
/// tool, add it here. Filesystem tools are only exposed when a root path
/// confines them.
pub fn builtin_definitions(config: Arc<Config>) -> Vec<Arc<dyn ToolDefinition>> {
    let mut definitions: Vec<Arc<dyn ToolDefinition>> = vec![Arc::new(AddTool), Arc::new(GreetTool)];

    if config.security.root_path.is_some() {
        definitions.push(Arc::new(FsListDirTool::new(config.clone())));
        definitions.push(Arc::new(FsDeleteTool::new(config)));
    } else {
        warn!("MCP_ROOT_PATH not set - filesystem tools are not registered");
    }

    definitions
}

/// Names declared by more than one definition, sorted and deduplicated.
pub fn find_duplicate_names(definitions: &[Arc<dyn ToolDefinition>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = definitions
        .iter()
        .map(|def| def.metadata().name)
        .filter(|name| !seen.insert(name.clone()))
        .collect();
    duplicates.sort();
    duplicates.dedup();
    duplicates
}

// ============================================================================
// Registered tool
// ============================================================================

/// A tool definition together with everything derived from it at
/// registration time.
#[derive(Clone)]
pub struct RegisteredTool {
    metadata: ToolMetadata,
    schema: ParameterSchema,
    validator: Arc<CompiledSchema>,
    input_schema: Arc<JsonObject>,
    output_schema: Option<Arc<JsonObject>>,
    handler: Arc<dyn ToolDefinition>,
}

impl RegisteredTool {
    fn new(handler: Arc<dyn ToolDefinition>) -> Result<Self, ToolError> {
        let metadata = handler.metadata();
        metadata.validate()?;

        let schema = handler.schema();
        if let Some(name) = schema
            .names()
            .find(|name| schema.rule(name).is_some_and(|r| r.description().trim().is_empty()))
        {
            return Err(ToolError::invalid_definition(format!(
                "parameter '{}' of tool '{}' has no description",
                name, metadata.name
            )));
        }

        let validator = schema.compile().map_err(|e| {
            ToolError::invalid_definition(format!("tool '{}': {}", metadata.name, e))
        })?;

        Ok(Self {
            validator: Arc::new(validator),
            input_schema: Arc::new(schema.to_json_schema()),
            output_schema: handler.output_schema(),
            metadata,
            schema,
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.metadata.name.clone().into(),
            description: Some(self.metadata.description.clone().into()),
            input_schema: self.input_schema.clone(),
            annotations: Some(self.metadata.to_annotations()),
            output_schema: self.output_schema.clone(),
            icons: None,
            meta: None,
            title: self.metadata.hints.title.clone(),
        }
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("metadata", &self.metadata)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// Tools are keyed by unique name and listed in name order. The registry is
/// built once at startup and not modified while serving.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing every built-in tool.
    pub fn builtin(config: Arc<Config>) -> Result<Self, ToolError> {
        Self::from_definitions(builtin_definitions(config))
    }

    /// Build a registry from a list of definitions, failing on the first
    /// invalid or conflicting one.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, ToolError>
    where
        I: IntoIterator<Item = Arc<dyn ToolDefinition>>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register_arc(definition)?;
        }
        info!("Registered {} tools", registry.len());
        Ok(registry)
    }

    /// Register a tool definition.
    pub fn register<T: ToolDefinition + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool definition.
    ///
    /// Fails with [`ToolError::DuplicateName`] if the name is taken; the
    /// existing registration is kept.
    pub fn register_arc(&mut self, definition: Arc<dyn ToolDefinition>) -> Result<(), ToolError> {
        let tool = RegisteredTool::new(definition)?;
        let name = tool.name().to_string();

        if self.tools.contains_key(&name) {
            warn!("Tool name conflict: '{}' is already registered", name);
            return Err(ToolError::duplicate_name(name));
        }

        debug!("Registering tool: {}", name);
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.values().map(RegisteredTool::to_tool).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool by name.
    ///
    /// Unknown tools and invalid arguments are returned as `Err` and the
    /// routine is not invoked. Anything that goes wrong inside the routine
    /// comes back as a `CallToolResult` with `is_error` set.
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self.get(name).ok_or_else(|| {
            warn!("Unknown tool requested: {}", name);
            ToolError::not_found(name)
        })?;

        let params = tool.validator.validate(arguments.as_ref()).map_err(|errors| {
            warn!("Rejected arguments for '{}': {}", name, errors);
            ToolError::from(errors)
        })?;

        let result = match tool.handler.call(params).await {
            Ok(result) => shape_result(name, result),
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
        };

        Ok(result)
    }
}

/// Make sure a successful call carries at least one content item.
fn shape_result(name: &str, mut result: CallToolResult) -> CallToolResult {
    if !result.content.is_empty() {
        return result;
    }

    match &result.structured_content {
        Some(structured) => {
            result.content = vec![Content::text(structured.to_string())];
            result
        }
        None => {
            warn!("Tool '{}' returned no content", name);
            CallToolResult::error(vec![Content::text(format!(
                "Tool '{}' returned no content",
                name
            ))])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::schema::{ParamRule, ToolParams};
    use async_trait::async_trait;
    use rmcp::model::RawContent;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    fn sandboxed_config() -> Arc<Config> {
        let mut config = Config::default();
        config.security.root_path = Some(std::env::temp_dir());
        Arc::new(config)
    }

    fn args(value: serde_json::Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    /// Tool that counts invocations and returns whatever it is told to.
    struct CountingTool {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        outcome: fn() -> Result<CallToolResult, ToolError>,
    }

    impl CountingTool {
        fn new(name: &'static str, outcome: fn() -> Result<CallToolResult, ToolError>) -> Self {
            Self {
                name,
                calls: Arc::new(AtomicUsize::new(0)),
                outcome,
            }
        }
    }

    #[async_trait]
    impl ToolDefinition for CountingTool {
        fn metadata(&self) -> ToolMetadata {
            ToolMetadata::new(self.name, "Counts its invocations")
        }

        fn schema(&self) -> ParameterSchema {
            ParameterSchema::new().param("n", ParamRule::integer("Any integer"))
        }

        async fn call(&self, _params: ToolParams) -> Result<CallToolResult, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn ok_text() -> Result<CallToolResult, ToolError> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }

    #[test]
    fn test_registry_tool_names() {
        let registry = ToolRegistry::builtin(sandboxed_config()).unwrap();
        assert_eq!(
            registry.tool_names(),
            vec!["add", "fs_delete", "fs_list_dir", "greet"]
        );
    }

    #[test]
    fn test_fs_tools_require_root_path() {
        let registry = ToolRegistry::builtin(test_config()).unwrap();
        assert_eq!(registry.tool_names(), vec!["add", "greet"]);
        assert!(!registry.contains("fs_delete"));
    }

    #[test]
    fn test_list_tools_carries_schema_and_annotations() {
        let registry = ToolRegistry::builtin(sandboxed_config()).unwrap();
        let tools = registry.list_tools();
        assert_eq!(tools.len(), registry.len());

        let add = tools.iter().find(|t| t.name == "add").unwrap();
        assert_eq!(add.input_schema["type"], "object");
        assert_eq!(add.input_schema["required"], json!(["a", "b"]));
        let annotations = add.annotations.as_ref().unwrap();
        assert_eq!(annotations.read_only_hint, Some(true));

        let delete = tools.iter().find(|t| t.name == "fs_delete").unwrap();
        assert_eq!(delete.annotations.as_ref().unwrap().destructive_hint, Some(true));
        assert!(delete.output_schema.is_some());
    }

    #[tokio::test]
    async fn test_add_scenario() {
        let registry = ToolRegistry::builtin(test_config()).unwrap();
        let result = registry
            .call_tool("add", args(json!({"a": 2, "b": 3})))
            .await
            .unwrap();
        assert!(!result.content.is_empty());
        assert_eq!(text_of(&result), "5");
    }

    #[tokio::test]
    async fn test_add_rejects_string_argument() {
        let registry = ToolRegistry::builtin(test_config()).unwrap();
        let err = registry
            .call_tool("add", args(json!({"a": "x", "b": 3})))
            .await
            .unwrap_err();
        match err {
            ToolError::Validation(errors) => {
                assert_eq!(errors.parameters(), vec!["a"]);
                assert_eq!(errors.errors()[0].rule, "type");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_invoke_routine() {
        let counter = CountingTool::new("counter", ok_text);
        let calls = counter.calls.clone();
        let mut registry = ToolRegistry::new();
        registry.register(counter).unwrap();

        for bad in [json!({}), json!({"n": "1"}), json!({"n": 1.5}), json!({"n": null})] {
            let err = registry.call_tool("counter", args(bad)).await.unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_arguments_invoke_routine_once() {
        let counter = CountingTool::new("counter", ok_text);
        let calls = counter.calls.clone();
        let mut registry = ToolRegistry::new();
        registry.register(counter).unwrap();

        let result = registry.call_tool("counter", args(json!({"n": 7}))).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!result.content.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::builtin(test_config()).unwrap();
        let err = registry.call_tool("unknown", None).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "unknown"));
    }

    #[tokio::test]
    async fn test_routine_error_becomes_error_result() {
        let mut registry = ToolRegistry::new();
        registry
            .register(CountingTool::new("failing", || {
                Err(ToolError::execution_failed("upstream unavailable"))
            }))
            .unwrap();

        let result = registry.call_tool("failing", args(json!({"n": 1}))).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_empty_content_is_shaped() {
        let mut registry = ToolRegistry::new();
        registry
            .register(CountingTool::new("silent", || Ok(CallToolResult::success(vec![]))))
            .unwrap();
        registry
            .register(CountingTool::new("structured", || {
                Ok(CallToolResult {
                    content: vec![],
                    structured_content: Some(json!({"answer": 42})),
                    is_error: Some(false),
                    meta: None,
                })
            }))
            .unwrap();

        let silent = registry.call_tool("silent", args(json!({"n": 1}))).await.unwrap();
        assert_eq!(silent.is_error, Some(true));
        assert!(text_of(&silent).contains("returned no content"));

        let structured = registry
            .call_tool("structured", args(json!({"n": 1})))
            .await
            .unwrap();
        assert_ne!(structured.is_error, Some(true));
        assert_eq!(text_of(&structured), r#"{"answer":42}"#);
    }

    #[test]
    fn test_duplicate_names_are_detected() {
        let definitions: Vec<Arc<dyn ToolDefinition>> = vec![
            Arc::new(CountingTool::new("twin", ok_text)),
            Arc::new(AddTool),
            Arc::new(CountingTool::new("twin", ok_text)),
        ];

        assert_eq!(find_duplicate_names(&definitions), vec!["twin".to_string()]);

        let err = ToolRegistry::from_definitions(definitions).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateName(name) if name == "twin"));
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let first = CountingTool::new("twin", ok_text);
        let first_calls = first.calls.clone();
        let mut registry = ToolRegistry::new();
        registry.register(first).unwrap();
        assert!(registry.register(CountingTool::new("twin", ok_text)).is_err());
        assert_eq!(registry.len(), 1);

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(registry.call_tool("twin", args(json!({"n": 1}))))
            .unwrap();
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_builtin_table_has_no_duplicates() {
        assert!(find_duplicate_names(&builtin_definitions(sandboxed_config())).is_empty());
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry.register(CountingTool::new("bad name", ok_text)).unwrap_err();
        assert!(matches!(err, ToolError::InvalidDefinition(_)));
        assert!(registry.is_empty());
    }
}
