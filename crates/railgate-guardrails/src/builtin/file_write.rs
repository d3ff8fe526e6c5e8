//! File-write restriction guardrail
//!
//! Applies to configured write-capable tools only. The path argument is
//! checked against blocked globs first (sensitive files win over broad
//! allows), then must fall under one of the allowed prefixes. Globs use
//! full `globset` semantics including `**` and character classes.

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

use crate::context::ValidationContext;
use crate::guardrail::{Guardrail, GuardrailCategory};
use crate::result::{GuardrailResult, Severity};
use crate::{GuardrailError, Result};

pub const NAME: &str = "FileWriteRestriction";

/// Configuration for [`FileWriteRestriction`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWriteConfig {
    /// Directory prefixes writes are allowed under; must not be empty
    pub allowed_paths: Vec<String>,

    /// Globs that are never writable, even under an allowed prefix
    #[serde(default)]
    pub blocked_globs: Vec<String>,

    /// Tool names treated as write-capable
    #[serde(default = "default_write_tools")]
    pub write_tools: Vec<String>,

    /// Argument key carrying the target path
    #[serde(default = "default_path_arg")]
    pub path_arg: String,
}

fn default_write_tools() -> Vec<String> {
    vec![
        "file_write".to_string(),
        "write_file".to_string(),
        "save_file".to_string(),
    ]
}

fn default_path_arg() -> String {
    "path".to_string()
}

/// Path-glob policy predicate over write-capable tool invocations.
pub struct FileWriteRestriction {
    allowed_paths: Vec<String>,
    blocked: GlobSet,
    blocked_sources: Vec<String>,
    write_tools: HashSet<String>,
    path_arg: String,
}

impl FileWriteRestriction {
    pub fn new(config: FileWriteConfig) -> Result<Self> {
        if config.allowed_paths.is_empty() {
            return Err(GuardrailError::config("allowed_paths must not be empty"));
        }

        let mut builder = GlobSetBuilder::new();
        for source in &config.blocked_globs {
            let glob = Glob::new(source).map_err(|e| {
                GuardrailError::config(format!("invalid blocked glob '{source}': {e}"))
            })?;
            builder.add(glob);
        }
        let blocked = builder
            .build()
            .map_err(|e| GuardrailError::config(format!("blocked glob set: {e}")))?;

        Ok(Self {
            allowed_paths: config.allowed_paths,
            blocked,
            blocked_sources: config.blocked_globs,
            write_tools: config.write_tools.into_iter().collect(),
            path_arg: config.path_arg,
        })
    }

    fn is_allowed_prefix(&self, path: &str) -> bool {
        self.allowed_paths.iter().any(|prefix| path.starts_with(prefix))
    }
}

#[async_trait]
impl Guardrail for FileWriteRestriction {
    fn name(&self) -> &str {
        NAME
    }

    fn category(&self) -> GuardrailCategory {
        GuardrailCategory::Tool
    }

    async fn execute(
        &self,
        _content: &str,
        context: &ValidationContext,
    ) -> Result<GuardrailResult> {
        let Some(tool_call) = context.tool_call.as_ref() else {
            return Ok(GuardrailResult::allow(NAME, "no tool invocation to inspect"));
        };

        if !self.write_tools.contains(&tool_call.name) {
            return Ok(GuardrailResult::allow(
                NAME,
                format!("tool '{}' is not write-capable", tool_call.name),
            ));
        }

        let Some(path) = tool_call
            .arguments
            .get(&self.path_arg)
            .and_then(|v| v.as_str())
        else {
            return Ok(GuardrailResult::allow(
                NAME,
                format!("no '{}' argument to evaluate", self.path_arg),
            )
            .with_metadata("cannot_evaluate", json!(true)));
        };

        if let Some(idx) = self.blocked.matches(path).into_iter().next() {
            return Ok(GuardrailResult::block(
                NAME,
                Severity::Critical,
                format!("write to '{path}' matches a blocked pattern"),
            )
            .with_metadata("path", json!(path))
            .with_metadata("blocked_glob", json!(self.blocked_sources[idx])));
        }

        if self.is_allowed_prefix(path) {
            Ok(GuardrailResult::allow(NAME, format!("write to '{path}' permitted"))
                .with_metadata("path", json!(path)))
        } else {
            Ok(GuardrailResult::block(
                NAME,
                Severity::Error,
                format!("write to '{path}' is outside the allowed directories"),
            )
            .with_metadata("path", json!(path))
            .with_metadata("allowed_paths", json!(self.allowed_paths)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ToolCall, ValidationType};
    use crate::result::GuardrailAction;

    fn guard() -> FileWriteRestriction {
        FileWriteRestriction::new(FileWriteConfig {
            allowed_paths: vec!["/workspace/".to_string(), "/tmp/".to_string()],
            blocked_globs: vec!["**/.env".to_string(), "**/.ssh/**".to_string()],
            write_tools: default_write_tools(),
            path_arg: default_path_arg(),
        })
        .unwrap()
    }

    fn write_ctx(path: &str) -> ValidationContext {
        ValidationContext::new(ValidationType::Input)
            .with_tool_call(ToolCall::new("file_write", serde_json::json!({ "path": path })))
    }

    #[test]
    fn test_empty_allowed_paths_rejected() {
        let result = FileWriteRestriction::new(FileWriteConfig {
            allowed_paths: Vec::new(),
            blocked_globs: Vec::new(),
            write_tools: default_write_tools(),
            path_arg: default_path_arg(),
        });
        assert!(matches!(result, Err(GuardrailError::Config(_))));
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let result = FileWriteRestriction::new(FileWriteConfig {
            allowed_paths: vec!["/tmp/".to_string()],
            blocked_globs: vec!["[unclosed".to_string()],
            write_tools: default_write_tools(),
            path_arg: default_path_arg(),
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_write_under_allowed_prefix() {
        let result = guard().execute("", &write_ctx("/workspace/src/main.rs")).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Allow);
    }

    #[tokio::test]
    async fn test_write_outside_allowed_prefix_blocks() {
        let result = guard().execute("", &write_ctx("/etc/passwd")).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Block);
        assert_eq!(result.severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_blocked_glob_wins_over_allowed_prefix() {
        let result = guard().execute("", &write_ctx("/workspace/app/.env")).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Block);
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.metadata.get("blocked_glob").unwrap(), "**/.env");
    }

    #[tokio::test]
    async fn test_ssh_dir_blocked() {
        let result = guard()
            .execute("", &write_ctx("/workspace/.ssh/authorized_keys"))
            .await
            .unwrap();
        assert_eq!(result.action, GuardrailAction::Block);
    }

    #[tokio::test]
    async fn test_non_write_tool_ignored() {
        let ctx = ValidationContext::new(ValidationType::Input)
            .with_tool_call(ToolCall::new("file_read", serde_json::json!({"path": "/etc/passwd"})));
        let result = guard().execute("", &ctx).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Allow);
    }

    #[tokio::test]
    async fn test_missing_path_argument_cannot_evaluate() {
        let ctx = ValidationContext::new(ValidationType::Input)
            .with_tool_call(ToolCall::new("file_write", serde_json::json!({"contents": "x"})));
        let result = guard().execute("", &ctx).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Allow);
        assert_eq!(result.metadata.get("cannot_evaluate").unwrap(), true);
    }

    #[tokio::test]
    async fn test_no_tool_call_allows() {
        let ctx = ValidationContext::new(ValidationType::Input);
        let result = guard().execute("", &ctx).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Allow);
    }
}
