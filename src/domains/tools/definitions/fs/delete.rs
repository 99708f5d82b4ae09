//! Delete tool definition.
//!
//! A tool that deletes files and directories.

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{CallToolResult, Content, JsonObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::config::Config;
use crate::core::security::{PathGuard, PathSecurityError};
use crate::domains::tools::definitions::ToolDefinition;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::metadata::ToolMetadata;
use crate::domains::tools::schema::{ParamRule, ParameterSchema, ToolParams};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the delete tool.
#[derive(Debug, Clone, Deserialize)]
pub struct FsDeleteParams {
    /// Path to the file or directory to delete.
    pub path: String,

    /// Recursively delete directories and their contents.
    pub recursive: bool,
}

// ============================================================================
// Output Structure (JSON format for AI agents)
// ============================================================================

/// Result of a delete operation
#[derive(Debug, Serialize, JsonSchema)]
struct DeleteResult {
    /// Path that was deleted
    path: String,
    /// Type of item deleted ("file", "directory", or "symlink")
    item_type: String,
    /// Whether the operation succeeded
    success: bool,
    /// Whether recursive deletion was used
    #[serde(skip_serializing_if = "Option::is_none")]
    recursive: Option<bool>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Delete tool - deletes files and directories.
pub struct FsDeleteTool {
    config: Arc<Config>,
}

impl FsDeleteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "fs_delete";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Delete a file or directory. Use recursive=true to delete non-empty directories and their contents.";

    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsDeleteParams, config: &Config) -> Result<CallToolResult, ToolError> {
        info!("Delete tool called: '{}'", params.path);

        let target = match resolve_target(&params.path, config) {
            Ok(target) => target,
            Err(message) => {
                warn!("{}", message);
                return Ok(CallToolResult::error(vec![Content::text(message)]));
            }
        };

        let is_directory = matches!(target, Target::Directory(_));
        let item_type = target.item_type();
        let target_path = target.path();

        if is_directory && !params.recursive {
            match fs::read_dir(target_path) {
                Ok(mut entries) => {
                    if entries.next().is_some() {
                        warn!(
                            "Directory is not empty and recursive flag is not set: {}",
                            params.path
                        );
                        return Ok(CallToolResult::error(vec![Content::text(format!(
                            "Directory is not empty: {}. Use recursive=true to delete it and its contents.",
                            params.path
                        ))]));
                    }
                }
                Err(e) => {
                    warn!("Failed to read directory '{}': {}", params.path, e);
                    return Ok(CallToolResult::error(vec![Content::text(format!(
                        "Failed to read directory '{}': {}",
                        params.path, e
                    ))]));
                }
            }
        }

        let delete_result = match &target {
            Target::Directory(path) if params.recursive => fs::remove_dir_all(path),
            Target::Directory(path) => fs::remove_dir(path),
            Target::Symlink(path) | Target::File(path) => fs::remove_file(path),
        };

        match delete_result {
            Ok(_) => {
                info!("Successfully deleted '{}' ({})", params.path, item_type);

                let recursive = params.recursive && is_directory;
                let summary = if recursive {
                    format!(
                        "Successfully deleted {} '{}' and all its contents",
                        item_type, params.path
                    )
                } else {
                    format!("Successfully deleted {} '{}'", item_type, params.path)
                };

                let result = DeleteResult {
                    path: params.path.clone(),
                    item_type: item_type.to_string(),
                    success: true,
                    recursive: recursive.then_some(true),
                };
                let structured = serde_json::to_value(&result)
                    .map_err(|e| ToolError::internal(e.to_string()))?;

                // Text summary + structured content
                Ok(CallToolResult {
                    content: vec![Content::text(summary)],
                    structured_content: Some(structured),
                    is_error: Some(false),
                    meta: None,
                })
            }
            Err(e) => {
                warn!("Failed to delete '{}': {}", params.path, e);

                let error_msg = if e.kind() == std::io::ErrorKind::PermissionDenied {
                    format!("Permission denied: Cannot delete '{}'", params.path)
                } else if e.kind() == std::io::ErrorKind::NotFound {
                    format!("Path not found: '{}'", params.path)
                } else {
                    format!("Failed to delete '{}': {}", params.path, e)
                };

                Ok(CallToolResult::error(vec![Content::text(error_msg)]))
            }
        }
    }
}

/// What a delete request resolved to. Paths are canonical; a symlink keeps
/// its own name under its canonical parent so the link is removed, not its
/// target.
enum Target {
    Symlink(PathBuf),
    Directory(PathBuf),
    File(PathBuf),
}

impl Target {
    fn path(&self) -> &Path {
        match self {
            Self::Symlink(path) | Self::Directory(path) | Self::File(path) => path,
        }
    }

    fn item_type(&self) -> &'static str {
        match self {
            Self::Symlink(_) => "symlink",
            Self::Directory(_) => "directory",
            Self::File(_) => "file",
        }
    }
}

fn resolve_target(input: &str, config: &Config) -> Result<Target, String> {
    let security_error = |e: PathSecurityError| format!("Path security validation failed: {}", e);

    let guard = PathGuard::new(&config.security).map_err(security_error)?;
    let canonical = guard.resolve(input).map_err(security_error)?;

    let path = Path::new(input);
    let is_symlink = path
        .symlink_metadata()
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);

    if is_symlink {
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("Invalid symlink path: '{}'", input))?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let parent = guard
            .resolve(&parent.to_string_lossy())
            .map_err(security_error)?;
        return Ok(Target::Symlink(parent.join(file_name)));
    }

    if guard.root() == Some(canonical.as_path()) {
        return Err(format!("Refusing to delete the root directory '{}'", input));
    }

    if canonical.is_dir() {
        Ok(Target::Directory(canonical))
    } else {
        Ok(Target::File(canonical))
    }
}

#[async_trait]
impl ToolDefinition for FsDeleteTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(Self::NAME, Self::DESCRIPTION)
            .title("Delete File or Directory")
            .destructive()
            .open_world(false)
    }

    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .param(
                "path",
                ParamRule::string("Path to the file or directory to delete").min_length(1),
            )
            .param(
                "recursive",
                ParamRule::boolean(
                    "Recursively delete directories and their contents. Required to delete non-empty directories.",
                )
                .with_default(false),
            )
    }

    fn output_schema(&self) -> Option<Arc<JsonObject>> {
        Some(cached_schema_for_type::<DeleteResult>())
    }

    async fn call(&self, params: ToolParams) -> Result<CallToolResult, ToolError> {
        let params: FsDeleteParams = params.parse()?;
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || Self::execute(&params, &config))
            .await
            .map_err(|e| ToolError::internal(format!("delete task failed: {}", e)))?
    }
}

// ============================================================================
// Tests
// ============================================================================
