//! Guardrail registry: name-keyed factory lookup
//!
//! Profiles reference guardrails by string name, so the registered name
//! space is an external contract — renaming an entry breaks every stored
//! profile that uses it. The registry is populated once at startup from the
//! fixed bootstrap table and is read-only afterwards; resolution is safe
//! from any number of threads.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::builtin::{
    credential_leak::CredentialLeakConfig, destructive_ops::DestructiveOperationConfig,
    file_write::FileWriteConfig, model_pin::ModelPinningConfig, nsfw::NsfwConfig,
    pii_redaction::PiiRedactionConfig, prompt_injection::PromptInjectionConfig,
    rate_limit::RateLimitConfig, tool_access::ToolAccessConfig, ApiRateLimit, CredentialLeak,
    DestructiveOperation, FileWriteRestriction, ModelPinning, NsfwContent, PiiRedaction,
    PromptInjectionSignature, RateLimitStore, ToolAccess,
};
use crate::error::{GuardrailError, Result};
use crate::guardrail::Guardrail;

/// Builds a configured guardrail from its raw profile config.
pub type GuardrailFactory =
    dyn Fn(&Value) -> Result<Arc<dyn Guardrail>> + Send + Sync + 'static;

/// Name → factory lookup used to instantiate a profile's guardrail list.
#[derive(Clone, Default)]
pub struct GuardrailRegistry {
    factories: Arc<DashMap<String, Arc<GuardrailFactory>>>,
}

impl GuardrailRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in guardrail.
    ///
    /// All `ApiRateLimit` instances resolved from this registry share one
    /// process-wide bucket store.
    pub fn bootstrap() -> Self {
        let registry = Self::new();
        let store = RateLimitStore::new();

        registry.register("PromptInjectionSignature", |config| {
            let config: PromptInjectionConfig = parse_config(config)?;
            Ok(Arc::new(PromptInjectionSignature::new(config)?))
        });
        registry.register("NsfwContent", |config| {
            let config: NsfwConfig = parse_config(config)?;
            Ok(Arc::new(NsfwContent::new(config)?))
        });
        registry.register("PiiRedaction", |config| {
            let config: PiiRedactionConfig = parse_config(config)?;
            Ok(Arc::new(PiiRedaction::new(config)?))
        });
        registry.register("CredentialLeak", |config| {
            let config: CredentialLeakConfig = parse_config(config)?;
            Ok(Arc::new(CredentialLeak::new(config)?))
        });
        registry.register("ModelPinning", |config| {
            let config: ModelPinningConfig = parse_config(config)?;
            Ok(Arc::new(ModelPinning::new(config)?))
        });
        registry.register("ApiRateLimit", move |config| {
            let config: RateLimitConfig = parse_config(config)?;
            Ok(Arc::new(ApiRateLimit::new(config, store.clone())?))
        });
        registry.register("ToolAccess", |config| {
            let config: ToolAccessConfig = parse_config(config)?;
            Ok(Arc::new(ToolAccess::new(config)?))
        });
        registry.register("DestructiveOperation", |config| {
            let config: DestructiveOperationConfig = parse_config(config)?;
            Ok(Arc::new(DestructiveOperation::new(config)?))
        });
        registry.register("FileWriteRestriction", |config| {
            let config: FileWriteConfig = parse_config(config)?;
            Ok(Arc::new(FileWriteRestriction::new(config)?))
        });

        tracing::info!("Bootstrapped guardrail registry with {} entries", registry.len());
        registry
    }

    /// Register a factory under `name`. A later registration for the same
    /// name replaces the earlier one.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> Result<Arc<dyn Guardrail>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            tracing::debug!("Replaced guardrail factory: {}", name);
        } else {
            tracing::debug!("Registered guardrail factory: {}", name);
        }
    }

    /// Instantiate the named guardrail with `config`.
    ///
    /// Configuration problems surface here, while the pipeline is being
    /// assembled, never during request evaluation.
    pub fn resolve(&self, name: &str, config: &Value) -> Result<Arc<dyn Guardrail>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| GuardrailError::UnknownGuardrail(name.to_string()))?;
        factory(config)
    }

    /// Whether `name` has a registered factory.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, unordered.
    pub fn names(&self) -> Vec<String> {
        self.factories.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

fn parse_config<T: serde::de::DeserializeOwned>(config: &Value) -> Result<T> {
    serde_json::from_value(config.clone())
        .map_err(|e| GuardrailError::config(format!("malformed guardrail config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ValidationContext, ValidationType};
    use crate::guardrail::GuardrailCategory;
    use crate::result::GuardrailResult;
    use async_trait::async_trait;
    use serde_json::json;

    struct Stub(&'static str);

    #[async_trait]
    impl Guardrail for Stub {
        fn name(&self) -> &str {
            self.0
        }

        fn category(&self) -> GuardrailCategory {
            GuardrailCategory::General
        }

        async fn execute(
            &self,
            _content: &str,
            _context: &ValidationContext,
        ) -> Result<GuardrailResult> {
            Ok(GuardrailResult::allow(self.0, "stub"))
        }
    }

    #[test]
    fn test_bootstrap_table() {
        let registry = GuardrailRegistry::bootstrap();
        for name in [
            "PromptInjectionSignature",
            "NsfwContent",
            "PiiRedaction",
            "CredentialLeak",
            "ModelPinning",
            "ApiRateLimit",
            "ToolAccess",
            "DestructiveOperation",
            "FileWriteRestriction",
        ] {
            assert!(registry.contains(name), "missing bootstrap entry: {name}");
        }
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = GuardrailRegistry::bootstrap();
        let result = registry.resolve("NoSuchGuardrail", &json!({}));
        assert!(matches!(result, Err(GuardrailError::UnknownGuardrail(_))));
    }

    #[test]
    fn test_resolve_builtin_with_defaults() {
        let registry = GuardrailRegistry::bootstrap();
        let guard = registry.resolve("PromptInjectionSignature", &json!({})).unwrap();
        assert_eq!(guard.name(), "PromptInjectionSignature");
    }

    #[test]
    fn test_resolve_propagates_config_error() {
        let registry = GuardrailRegistry::bootstrap();
        // ModelPinning with an empty allow-list fails at resolution
        let result = registry.resolve("ModelPinning", &json!({ "allowed_models": [] }));
        assert!(matches!(result, Err(GuardrailError::Config(_))));
    }

    #[test]
    fn test_resolve_rejects_malformed_config() {
        let registry = GuardrailRegistry::bootstrap();
        let result = registry.resolve("ApiRateLimit", &json!({ "limit": "a lot" }));
        assert!(matches!(result, Err(GuardrailError::Config(_))));
    }

    #[test]
    fn test_later_registration_overwrites() {
        let registry = GuardrailRegistry::new();
        registry.register("Check", |_| Ok(Arc::new(Stub("first"))));
        registry.register("Check", |_| Ok(Arc::new(Stub("second"))));

        assert_eq!(registry.len(), 1);
        let guard = registry.resolve("Check", &json!({})).unwrap();
        assert_eq!(guard.name(), "second");
    }

    #[tokio::test]
    async fn test_rate_limit_instances_share_store() {
        let registry = GuardrailRegistry::bootstrap();
        let config = json!({ "limit": 1, "window_ms": 60000 });
        let a = registry.resolve("ApiRateLimit", &config).unwrap();
        let b = registry.resolve("ApiRateLimit", &config).unwrap();

        let ctx = ValidationContext::new(ValidationType::Input).with_api_key_id("shared-key");
        let first = a.execute("", &ctx).await.unwrap();
        assert!(first.passed);
        // The second instance sees the first instance's bucket
        let second = b.execute("", &ctx).await.unwrap();
        assert!(!second.passed);
    }
}
