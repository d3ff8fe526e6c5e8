//! Pipeline executor: sequential, fault-isolating, short-circuiting
//!
//! Guardrails run one after another in list order. The first Block stops
//! the pipeline; guardrails after it never execute. A guardrail that errors
//! is contained: the executor synthesizes a blocking result carrying the
//! error's message and the pipeline short-circuits exactly as it would for
//! a genuine policy Block. `run` itself never fails.

use std::sync::Arc;
use std::time::Instant;

use crate::context::ValidationContext;
use crate::guardrail::Guardrail;
use crate::result::{ExecutionResult, GuardrailResult, Severity};

/// An ordered guardrail list bound to one validation profile.
#[derive(Clone, Default)]
pub struct GuardrailPipeline {
    guardrails: Vec<Arc<dyn Guardrail>>,
}

impl GuardrailPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an already-resolved ordered list.
    pub fn from_guardrails(guardrails: Vec<Arc<dyn Guardrail>>) -> Self {
        Self { guardrails }
    }

    /// Append a guardrail; execution order is insertion order.
    pub fn with_guardrail<G: Guardrail + 'static>(mut self, guardrail: G) -> Self {
        self.guardrails.push(Arc::new(guardrail));
        self
    }

    /// Append an already-shared guardrail.
    pub fn with_shared(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    pub fn len(&self) -> usize {
        self.guardrails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guardrails.is_empty()
    }

    /// Names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.guardrails.iter().map(|g| g.name()).collect()
    }

    /// Run every guardrail against one content item, in order, stopping at
    /// the first Block. Always returns a well-formed result.
    pub async fn run(&self, content: &str, context: &ValidationContext) -> ExecutionResult {
        let started = Instant::now();
        let mut results = Vec::with_capacity(self.guardrails.len());

        for guardrail in &self.guardrails {
            let result = match guardrail.execute(content, context).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(
                        guardrail = guardrail.name(),
                        error = %e,
                        "guardrail failed; synthesizing blocking result"
                    );
                    GuardrailResult::block(guardrail.name(), Severity::Error, e.to_string())
                }
            };

            let blocking = result.is_blocking();
            if blocking {
                tracing::warn!(
                    guardrail = guardrail.name(),
                    message = %result.message,
                    "guardrail blocked content"
                );
            }

            results.push(result);

            if blocking {
                break;
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        ExecutionResult::from_results(results, elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationType;
    use crate::guardrail::GuardrailCategory;
    use crate::result::GuardrailAction;
    use crate::{GuardrailError, Result};
    use async_trait::async_trait;

    struct Always(GuardrailAction);

    #[async_trait]
    impl Guardrail for Always {
        fn name(&self) -> &str {
            match self.0 {
                GuardrailAction::Allow => "always_allow",
                GuardrailAction::Warn => "always_warn",
                GuardrailAction::Block => "always_block",
                GuardrailAction::Modify => "always_modify",
            }
        }

        fn category(&self) -> GuardrailCategory {
            GuardrailCategory::General
        }

        async fn execute(
            &self,
            content: &str,
            _context: &ValidationContext,
        ) -> Result<GuardrailResult> {
            Ok(match self.0 {
                GuardrailAction::Allow => GuardrailResult::allow(self.name(), "ok"),
                GuardrailAction::Warn => {
                    GuardrailResult::warn(self.name(), Severity::Warning, "careful")
                }
                GuardrailAction::Block => {
                    GuardrailResult::block(self.name(), Severity::Error, "rejected")
                }
                GuardrailAction::Modify => {
                    GuardrailResult::modify(self.name(), "rewritten", content.to_uppercase())
                }
            })
        }
    }

    struct Faulty;

    #[async_trait]
    impl Guardrail for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        fn category(&self) -> GuardrailCategory {
            GuardrailCategory::General
        }

        async fn execute(
            &self,
            _content: &str,
            _context: &ValidationContext,
        ) -> Result<GuardrailResult> {
            Err(GuardrailError::execution("catalogue lookup failed"))
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext::new(ValidationType::Input)
    }

    #[tokio::test]
    async fn test_empty_pipeline_passes() {
        let pipeline = GuardrailPipeline::new();
        let result = pipeline.run("anything", &ctx()).await;
        assert!(result.passed);
        assert_eq!(result.summary.total, 0);
    }

    #[tokio::test]
    async fn test_all_allow() {
        let pipeline = GuardrailPipeline::new()
            .with_guardrail(Always(GuardrailAction::Allow))
            .with_guardrail(Always(GuardrailAction::Allow));

        let result = pipeline.run("hello", &ctx()).await;
        assert!(result.passed);
        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.passed, 2);
        assert_eq!(result.summary.failed, 0);
    }

    #[tokio::test]
    async fn test_block_short_circuits() {
        let pipeline = GuardrailPipeline::new()
            .with_guardrail(Always(GuardrailAction::Allow))
            .with_guardrail(Always(GuardrailAction::Block))
            .with_guardrail(Always(GuardrailAction::Allow));

        let result = pipeline.run("hello", &ctx()).await;
        assert!(!result.passed);
        // The third guardrail never ran
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.passed, 1);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.results[1].guardrail, "always_block");
    }

    #[tokio::test]
    async fn test_warn_does_not_short_circuit() {
        let pipeline = GuardrailPipeline::new()
            .with_guardrail(Always(GuardrailAction::Warn))
            .with_guardrail(Always(GuardrailAction::Allow));

        let result = pipeline.run("hello", &ctx()).await;
        assert!(result.passed);
        assert_eq!(result.results.len(), 2);
    }

    #[tokio::test]
    async fn test_modify_does_not_short_circuit() {
        let pipeline = GuardrailPipeline::new()
            .with_guardrail(Always(GuardrailAction::Modify))
            .with_guardrail(Always(GuardrailAction::Allow));

        let result = pipeline.run("hello", &ctx()).await;
        assert!(result.passed);
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].redacted_text.as_deref(), Some("HELLO"));
    }

    #[tokio::test]
    async fn test_faulty_guardrail_is_contained() {
        let pipeline = GuardrailPipeline::new()
            .with_guardrail(Always(GuardrailAction::Allow))
            .with_guardrail(Faulty)
            .with_guardrail(Always(GuardrailAction::Allow));

        let result = pipeline.run("hello", &ctx()).await;
        assert!(!result.passed);
        assert_eq!(result.results.len(), 2);

        let synthesized = &result.results[1];
        assert_eq!(synthesized.guardrail, "faulty");
        assert_eq!(synthesized.action, GuardrailAction::Block);
        assert_eq!(synthesized.severity, Severity::Error);
        assert!(synthesized.message.contains("catalogue lookup failed"));
    }

    #[tokio::test]
    async fn test_execution_order_preserved() {
        let pipeline = GuardrailPipeline::new()
            .with_guardrail(Always(GuardrailAction::Warn))
            .with_guardrail(Always(GuardrailAction::Modify))
            .with_guardrail(Always(GuardrailAction::Allow));

        let result = pipeline.run("x", &ctx()).await;
        let order: Vec<&str> = result.results.iter().map(|r| r.guardrail.as_str()).collect();
        assert_eq!(order, vec!["always_warn", "always_modify", "always_allow"]);
    }

    #[tokio::test]
    async fn test_names_reflect_order() {
        let pipeline = GuardrailPipeline::new()
            .with_guardrail(Always(GuardrailAction::Allow))
            .with_guardrail(Faulty);
        assert_eq!(pipeline.names(), vec!["always_allow", "faulty"]);
    }
}
