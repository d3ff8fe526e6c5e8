//! Model pinning guardrail
//!
//! Requests must target one of the allow-listed model identifiers. An empty
//! allow-list is a configuration error caught at construction; a context
//! with no model fact cannot be evaluated and passes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

use crate::context::ValidationContext;
use crate::guardrail::{Guardrail, GuardrailCategory};
use crate::result::{GuardrailResult, Severity};
use crate::{GuardrailError, Result};

pub const NAME: &str = "ModelPinning";

/// Configuration for [`ModelPinning`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelPinningConfig {
    /// Model identifiers requests may use
    #[serde(default)]
    pub allowed_models: Vec<String>,
}

/// Allow-list membership check over the requested model id.
pub struct ModelPinning {
    allowed: HashSet<String>,
}

impl ModelPinning {
    pub fn new(config: ModelPinningConfig) -> Result<Self> {
        if config.allowed_models.is_empty() {
            return Err(GuardrailError::config(
                "allowed_models must not be empty",
            ));
        }
        Ok(Self {
            allowed: config.allowed_models.into_iter().collect(),
        })
    }
}

#[async_trait]
impl Guardrail for ModelPinning {
    fn name(&self) -> &str {
        NAME
    }

    fn category(&self) -> GuardrailCategory {
        GuardrailCategory::General
    }

    async fn execute(
        &self,
        _content: &str,
        context: &ValidationContext,
    ) -> Result<GuardrailResult> {
        let Some(model) = context.model.as_deref() else {
            return Ok(GuardrailResult::allow(NAME, "no model in context")
                .with_metadata("evaluated", json!(false)));
        };

        if self.allowed.contains(model) {
            Ok(GuardrailResult::allow(NAME, format!("model '{model}' is pinned"))
                .with_metadata("model", json!(model)))
        } else {
            Ok(GuardrailResult::block(
                NAME,
                Severity::Error,
                format!("model '{model}' is not in the pinned allow-list"),
            )
            .with_metadata("model", json!(model))
            .with_metadata("allowed_models", json!(self.allowed.iter().collect::<Vec<_>>())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationType;
    use crate::result::GuardrailAction;

    fn guard() -> ModelPinning {
        ModelPinning::new(ModelPinningConfig {
            allowed_models: vec!["gpt-4o".to_string(), "claude-sonnet".to_string()],
        })
        .unwrap()
    }

    #[test]
    fn test_empty_allowlist_rejected_at_construction() {
        let result = ModelPinning::new(ModelPinningConfig::default());
        assert!(matches!(result, Err(GuardrailError::Config(_))));
    }

    #[tokio::test]
    async fn test_pinned_model_allows() {
        let ctx = ValidationContext::new(ValidationType::Input).with_model("gpt-4o");
        let result = guard().execute("hi", &ctx).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Allow);
    }

    #[tokio::test]
    async fn test_unpinned_model_blocks() {
        let ctx = ValidationContext::new(ValidationType::Input).with_model("experimental-model");
        let result = guard().execute("hi", &ctx).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Block);
        assert_eq!(result.metadata.get("model").unwrap(), "experimental-model");
    }

    #[tokio::test]
    async fn test_missing_model_cannot_evaluate() {
        let ctx = ValidationContext::new(ValidationType::Input);
        let result = guard().execute("hi", &ctx).await.unwrap();
        assert_eq!(result.action, GuardrailAction::Allow);
        assert_eq!(result.metadata.get("evaluated").unwrap(), false);
    }
}
