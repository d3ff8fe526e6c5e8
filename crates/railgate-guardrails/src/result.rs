//! Guardrail and pipeline results
//!
//! `passed` is derived from the action, never set independently: a result
//! fails exactly when its action is `Block`. Allow, Warn, and Modify all
//! pass. The constructors below are the only way results are produced, so
//! the invariant holds everywhere downstream.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the pipeline should do about a guardrail's finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardrailAction {
    /// No finding, pass the content through
    Allow,
    /// Surface a warning but let the content through
    Warn,
    /// Reject the content and stop the pipeline
    Block,
    /// Pass through a transformed form of the content (see `redacted_text`)
    Modify,
}

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// The outcome of one guardrail's evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailResult {
    /// Name of the guardrail that produced this result
    pub guardrail: String,

    /// False exactly when `action == Block`
    pub passed: bool,

    /// Recommended action
    pub action: GuardrailAction,

    /// Severity of the finding
    pub severity: Severity,

    /// Human-readable explanation
    pub message: String,

    /// Open diagnostic payload; ensemble guardrails put their signals here
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Transformed content, present on `Modify` results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redacted_text: Option<String>,
}

impl GuardrailResult {
    fn new(
        guardrail: impl Into<String>,
        action: GuardrailAction,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            guardrail: guardrail.into(),
            passed: action != GuardrailAction::Block,
            action,
            severity,
            message: message.into(),
            metadata: Map::new(),
            redacted_text: None,
        }
    }

    /// A clean pass
    pub fn allow(guardrail: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(guardrail, GuardrailAction::Allow, Severity::Info, message)
    }

    /// A finding worth surfacing that does not stop the pipeline
    pub fn warn(
        guardrail: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self::new(guardrail, GuardrailAction::Warn, severity, message)
    }

    /// A finding that rejects the content and short-circuits the pipeline
    pub fn block(
        guardrail: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self::new(guardrail, GuardrailAction::Block, severity, message)
    }

    /// Pass, but with a transformed form of the content attached
    pub fn modify(
        guardrail: impl Into<String>,
        message: impl Into<String>,
        redacted_text: impl Into<String>,
    ) -> Self {
        let mut result = Self::new(guardrail, GuardrailAction::Modify, Severity::Warning, message);
        result.redacted_text = Some(redacted_text.into());
        result
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether this result stops the pipeline
    pub fn is_blocking(&self) -> bool {
        self.action == GuardrailAction::Block
    }
}

/// Counts over the guardrails that actually ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Aggregate outcome of running a pipeline against one content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// False exactly when some executed guardrail blocked
    pub passed: bool,

    /// Results for the guardrails that ran, in execution order
    pub results: Vec<GuardrailResult>,

    /// Counts over `results`
    pub summary: ExecutionSummary,

    /// Wall-clock duration of the executed guardrails
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    /// Build the aggregate from per-guardrail results.
    pub fn from_results(results: Vec<GuardrailResult>, execution_time_ms: u64) -> Self {
        let passed_count = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed_count;
        Self {
            passed: failed == 0,
            summary: ExecutionSummary {
                total: results.len(),
                passed: passed_count,
                failed,
            },
            results,
            execution_time_ms,
        }
    }

    /// The first blocking result, if any
    pub fn blocking_result(&self) -> Option<&GuardrailResult> {
        self.results.iter().find(|r| r.is_blocking())
    }
}
