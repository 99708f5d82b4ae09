//! Tool metadata: identity, description and advisory behavior hints.

use rmcp::model::ToolAnnotations;
use serde::{Deserialize, Serialize};

use super::error::ToolError;

/// Longest tool name accepted by the registry.
pub const MAX_NAME_LEN: usize = 128;

/// Behavioral hints advertised to clients.
///
/// Hints are documentation only. Nothing in the server checks that a tool
/// marked `read_only` actually avoids side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolHints {
    /// Human-friendly display title.
    pub title: Option<String>,

    /// The tool does not modify its environment.
    pub read_only: bool,

    /// The tool may perform destructive updates.
    pub destructive: bool,

    /// Repeating a call with the same arguments has no additional effect.
    pub idempotent: bool,

    /// The tool talks to an open world of external entities (network, ...).
    pub open_world: Option<bool>,
}

/// Identity and description of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Unique name within the registry.
    pub name: String,

    /// Description shown to clients.
    pub description: String,

    /// Advisory hints.
    pub hints: ToolHints,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            hints: ToolHints::default(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.hints.title = Some(title.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.hints.read_only = true;
        self
    }

    pub fn destructive(mut self) -> Self {
        self.hints.destructive = true;
        self
    }

    pub fn idempotent(mut self) -> Self {
        self.hints.idempotent = true;
        self
    }

    pub fn open_world(mut self, open_world: bool) -> Self {
        self.hints.open_world = Some(open_world);
        self
    }

    /// Check that the metadata can be registered.
    ///
    /// Names are 1 to [`MAX_NAME_LEN`] characters of `[A-Za-z0-9_.-]`;
    /// descriptions must not be blank.
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.name.is_empty() {
            return Err(ToolError::invalid_definition("tool name must not be empty"));
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(ToolError::invalid_definition(format!(
                "tool name '{}' exceeds {} characters",
                self.name, MAX_NAME_LEN
            )));
        }
        if let Some(c) = self
            .name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(ToolError::invalid_definition(format!(
                "tool name '{}' contains invalid character {:?}",
                self.name, c
            )));
        }
        if self.description.trim().is_empty() {
            return Err(ToolError::invalid_definition(format!(
                "tool '{}' has an empty description",
                self.name
            )));
        }
        Ok(())
    }

    /// MCP annotations (`readOnlyHint`, `destructiveHint`, ...).
    pub fn to_annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: self.hints.title.clone(),
            read_only_hint: Some(self.hints.read_only),
            destructive_hint: Some(self.hints.destructive),
            idempotent_hint: Some(self.hints.idempotent),
            open_world_hint: self.hints.open_world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_hints() {
        let meta = ToolMetadata::new("fs_delete", "Delete a file")
            .title("Delete")
            .destructive();
        assert_eq!(meta.hints.title.as_deref(), Some("Delete"));
        assert!(meta.hints.destructive);
        assert!(!meta.hints.read_only);
        assert!(!meta.hints.idempotent);
    }

    #[test]
    fn test_valid_names() {
        for name in ["add", "fs_list_dir", "math.add", "get-weather", "A1"] {
            assert!(ToolMetadata::new(name, "desc").validate().is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "has space", "slash/name", "émoji"] {
            let err = ToolMetadata::new(name, "desc").validate().unwrap_err();
            assert!(matches!(err, ToolError::InvalidDefinition(_)), "{}", name);
        }
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(ToolMetadata::new(long, "desc").validate().is_err());
    }

    #[test]
    fn test_blank_description_rejected() {
        assert!(ToolMetadata::new("add", "   ").validate().is_err());
    }

    #[test]
    fn test_annotations() {
        let annotations = ToolMetadata::new("add", "Add numbers")
            .title("Add")
            .read_only()
            .idempotent()
            .to_annotations();
        assert_eq!(annotations.title.as_deref(), Some("Add"));
        assert_eq!(annotations.read_only_hint, Some(true));
        assert_eq!(annotations.destructive_hint, Some(false));
        assert_eq!(annotations.idempotent_hint, Some(true));
        assert_eq!(annotations.open_world_hint, None);

        let json = serde_json::to_value(&annotations).unwrap();
        assert_eq!(json["readOnlyHint"], true);
        assert_eq!(json["idempotentHint"], true);
    }
}
