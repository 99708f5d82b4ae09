//! List directory tool definition.
//!
//! A tool that lists files and directories in a given path.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Content};
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::config::Config;
use crate::core::security::validate_path;
use crate::domains::tools::definitions::ToolDefinition;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::metadata::ToolMetadata;
use crate::domains::tools::schema::{ParamRule, ParameterSchema, ToolParams};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the list directory tool.
#[derive(Debug, Clone, Deserialize)]
pub struct FsListDirParams {
    /// Path to the directory to list.
    pub path: String,

    /// Include hidden files (starting with '.')
    pub include_hidden: bool,

    /// Show additional details (size, type)
    pub detailed: bool,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// List directory tool - lists files and directories in a given path.
pub struct FsListDirTool {
    config: Arc<Config>,
}

impl FsListDirTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "fs_list_dir";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "List files and directories in a given path. Returns names, types, and optionally sizes.";

    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Execute the tool logic.
    ///
    /// Filesystem problems are reported as error results rather than `Err`,
    /// so the client sees them as tool output.
    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &FsListDirParams, config: &Config) -> CallToolResult {
        info!("List directory tool called for path: {}", params.path);

        let path = match validate_path(&params.path, config) {
            Ok(p) => p,
            Err(e) => {
                warn!("Path security validation failed: {}", e);
                return CallToolResult::error(vec![Content::text(format!(
                    "Path security validation failed: {}",
                    e
                ))]);
            }
        };

        if !path.is_dir() {
            warn!("Path is not a directory: {}", params.path);
            return CallToolResult::error(vec![Content::text(format!(
                "Path is not a directory: {}",
                params.path
            ))]);
        }

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read directory: {}", e);
                return CallToolResult::error(vec![Content::text(format!(
                    "Failed to read directory: {}",
                    e
                ))]);
            }
        };

        let mut result_lines = Vec::new();
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error reading entry: {}", e);
                    continue;
                }
            };

            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if !params.include_hidden && name.starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!("Failed to get metadata for {}: {}", name, e);
                    continue;
                }
            };

            // Entry metadata does not follow links; links count as files.
            if metadata.is_dir() {
                dir_count += 1;
            } else {
                file_count += 1;
            }

            if params.detailed {
                let entry_type = if metadata.is_dir() {
                    "DIR "
                } else if metadata.is_symlink() {
                    "LINK"
                } else {
                    "FILE"
                };

                let size = if metadata.is_file() {
                    format_size(metadata.len())
                } else {
                    "-".to_string()
                };

                result_lines.push(format!("{:4}  {:>10}  {}", entry_type, size, name));
            } else if metadata.is_dir() {
                result_lines.push(format!("{}/", name));
            } else {
                result_lines.push(name.to_string());
            }
        }

        result_lines.sort();

        let mut response = format!("Directory: {}\n", params.path);
        if params.detailed {
            response.push_str("\nType  Size        Name\n");
            response.push_str("----  ----------  ----\n");
        }
        response.push_str(&result_lines.join("\n"));
        response.push_str(&format!(
            "\n\nTotal: {} directories, {} files",
            dir_count, file_count
        ));

        info!("Listed {} entries in {}", result_lines.len(), params.path);

        CallToolResult::success(vec![Content::text(response)])
    }
}

#[async_trait]
impl ToolDefinition for FsListDirTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(Self::NAME, Self::DESCRIPTION)
            .title("List Directory")
            .read_only()
            .idempotent()
            .open_world(false)
    }

    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .param(
                "path",
                ParamRule::string("Path to the directory to list").min_length(1),
            )
            .param(
                "include_hidden",
                ParamRule::boolean("Include hidden files (starting with '.')").with_default(false),
            )
            .param(
                "detailed",
                ParamRule::boolean("Show additional details (size, type)").with_default(false),
            )
    }

    async fn call(&self, params: ToolParams) -> Result<CallToolResult, ToolError> {
        let params: FsListDirParams = params.parse()?;
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || Self::execute(&params, &config))
            .await
            .map_err(|e| ToolError::internal(format!("list directory task failed: {}", e)))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

// ============================================================================
// Tests
// ============================================================================
