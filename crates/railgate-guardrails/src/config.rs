//! Validation profiles
//!
//! A profile is the ordered list of `(guardrail name, config)` pairs the
//! caller resolved from storage. Building a pipeline from a profile is the
//! fail-fast moment: unknown names and invalid configurations error here,
//! while the profile is being loaded, never in the per-request path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::executor::GuardrailPipeline;
use crate::registry::GuardrailRegistry;
use crate::Result;

/// One entry in a profile: which guardrail, with what configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailSpec {
    /// Registered guardrail name
    pub name: String,

    /// Guardrail-specific configuration, passed to the factory as-is
    #[serde(default = "empty_config")]
    pub config: Value,
}

fn empty_config() -> Value {
    Value::Object(serde_json::Map::new())
}

impl GuardrailSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: empty_config(),
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

/// An ordered, named guardrail list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationProfile {
    /// Profile name, for logs and execution records
    pub name: String,

    /// Guardrails in execution order
    #[serde(default)]
    pub guardrails: Vec<GuardrailSpec>,
}

impl ValidationProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guardrails: Vec::new(),
        }
    }

    pub fn with_guardrail(mut self, spec: GuardrailSpec) -> Self {
        self.guardrails.push(spec);
        self
    }

    /// Resolve every entry through the registry, preserving order.
    ///
    /// The first unknown name or invalid configuration aborts the build.
    pub fn build_pipeline(&self, registry: &GuardrailRegistry) -> Result<GuardrailPipeline> {
        let mut guardrails = Vec::with_capacity(self.guardrails.len());

        for spec in &self.guardrails {
            let guardrail = registry.resolve(&spec.name, &spec.config)?;
            guardrails.push(guardrail);
        }

        tracing::info!(
            profile = %self.name,
            guardrails = guardrails.len(),
            "Built guardrail pipeline"
        );

        Ok(GuardrailPipeline::from_guardrails(guardrails))
    }
}
