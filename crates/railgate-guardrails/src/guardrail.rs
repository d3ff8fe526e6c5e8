//! Guardrail trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::ValidationContext, result::GuardrailResult, Result};

/// Which part of a request a guardrail inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardrailCategory {
    /// User input checks
    Input,
    /// Model output checks
    Output,
    /// Tool invocation checks
    Tool,
    /// Applies regardless of direction
    General,
}

/// A single named, configured policy check.
///
/// Implementations read only the content, the context, and their own
/// validated configuration (rate limiters additionally share a designated
/// store). `execute` may return an error on unexpected internal failure —
/// containment is the executor's responsibility, and the error is turned
/// into a blocking result there. Configuration problems must be rejected in
/// the constructor, never surfaced from `execute`.
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// Stable name; the string profiles reference this guardrail by
    fn name(&self) -> &str;

    /// Which part of a request this guardrail inspects
    fn category(&self) -> GuardrailCategory;

    /// Evaluate one content item against this guardrail's policy
    async fn execute(&self, content: &str, context: &ValidationContext)
        -> Result<GuardrailResult>;
}
