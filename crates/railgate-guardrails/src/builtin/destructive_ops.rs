//! Destructive-operation guardrail
//!
//! A policy predicate over the tool/argument descriptor, with an explicit
//! allow-list escape hatch: tool invocations whose name or raw arguments
//! match a destructive pattern are blocked unless the tool is explicitly
//! trusted. The same shape as capability-token authorization, minus the
//! token.

use async_trait::async_trait;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

use crate::context::ValidationContext;
use crate::guardrail::{Guardrail, GuardrailCategory};
use crate::result::{GuardrailResult, Severity};
use crate::{GuardrailError, Result};

pub const NAME: &str = "DestructiveOperation";

/// Built-in destructive command/operation shapes.
const DESTRUCTIVE_PATTERNS: &[(&str, &str)] = &[
    ("recursive_delete", r"(?i)\brm\s+(-[a-z]*r[a-z]*f|-[a-z]*f[a-z]*r)\b"),
    ("drop_table", r"(?i)\bdrop\s+(table|database|schema)\b"),
    ("delete_without_where", r"(?i)\bdelete\s+from\s+\w+\s*(;|$)"),
    ("truncate", r"(?i)\btruncate\s+table\b"),
    ("force_push", r"(?i)\bgit\s+push\s+(--force|-f)\b"),
    ("mkfs", r"(?i)\bmkfs(\.\w+)?\b"),
    ("shutdown", r"(?i)\b(shutdown|reboot|halt)\b\s+(-|now)"),
    ("device_write", r"(?i)\bdd\s+.*\bof=/dev/"),
];

/// Configuration for [`DestructiveOperation`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestructiveOperationConfig {
    /// Tools trusted to perform destructive work; their invocations skip
    /// the pattern check entirely
    #[serde(default)]
    pub allowed_tools: Vec<String>,

    /// Additional destructive patterns beyond the built-in set
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}

/// Destructive-pattern predicate over tool invocations.
pub struct DestructiveOperation {
    allowed_tools: HashSet<String>,
    set: RegexSet,
    labels: Vec<String>,
}

impl DestructiveOperation {
    pub fn new(config: DestructiveOperationConfig) -> Result<Self> {
        let mut sources: Vec<String> = DESTRUCTIVE_PATTERNS
            .iter()
            .map(|(_, p)| (*p).to_string())
            .collect();
        let mut labels: Vec<String> = DESTRUCTIVE_PATTERNS
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect();

        for (i, extra) in config.extra_patterns.iter().enumerate() {
            // Validate each user pattern individually for a precise error.
            Regex::new(extra).map_err(|source| GuardrailError::InvalidPattern {
                pattern: extra.clone(),
                source,
            })?;
            sources.push(extra.clone());
            labels.push(format!("custom_{i}"));
        }

        let set = RegexSet::new(&sources)
            .map_err(|e| GuardrailError::config(format!("destructive pattern set: {e}")))?;

        Ok(Self {
            allowed_tools: config.allowed_tools.into_iter().collect(),
            set,
            labels,
        })
    }
}

#[async_trait]
impl Guardrail for DestructiveOperation {
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

        if self.allowed_tools.contains(&tool_call.name) {
            return Ok(GuardrailResult::allow(
                NAME,
                format!("tool '{}' is explicitly trusted", tool_call.name),
            )
            .with_metadata("allow_listed", json!(true)));
        }

        let haystack = format!("{} {}", tool_call.name, tool_call.arguments);
        let hits: Vec<&str> = self
            .set
            .matches(&haystack)
            .into_iter()
            .map(|idx| self.labels[idx].as_str())
            .collect();

        if hits.is_empty() {
            return Ok(GuardrailResult::allow(NAME, "no destructive operation detected"));
        }

        Ok(GuardrailResult::block(
            NAME,
            Severity::Critical,
            format!("destructive operation detected: {}", hits.join(", ")),
        )
        .with_metadata("patterns", json!(hits))
        .with_metadata("tool", json!(tool_call.name)))
    }
}
