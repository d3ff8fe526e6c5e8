//! Validation context: the read-only fact bag passed to every guardrail
//!
//! A context is assembled once per validation call from authenticated
//! request metadata. Every field except `validation_type` is optional, and
//! absence means "not applicable" — a guardrail whose relevant facts are
//! missing must treat the call as not evaluable and allow it rather than
//! guess.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::ToolAccessRequest;

/// Which direction of the conversation is being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    /// Content flowing from the user into the model
    Input,
    /// Content produced by the model
    Output,
}

/// A tool invocation under validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool being called
    pub name: String,
    /// Raw tool arguments
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Immutable per-call facts shared by every guardrail in a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Required: input or output validation
    pub validation_type: ValidationType,

    // Identity references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    // Behavioral signals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_violations: Option<u32>,

    // Tool invocation under validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,

    // Privileged tool-access descriptor (agent identity + capability token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_access: Option<ToolAccessRequest>,

    // Operational descriptors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry_opt_out: Option<bool>,

    // Security signals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_leak_suspected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_compromised: Option<bool>,
}

impl ValidationContext {
    /// Create a context with every optional fact absent.
    pub fn new(validation_type: ValidationType) -> Self {
        Self {
            validation_type,
            user_id: None,
            api_key_id: None,
            profile_id: None,
            client_ip: None,
            age_verified: None,
            prior_violations: None,
            tool_call: None,
            tool_access: None,
            model: None,
            tokens_used: None,
            estimated_cost: None,
            retention_days: None,
            telemetry_opt_out: None,
            credential_leak_suspected: None,
            key_compromised: None,
        }
    }

    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_api_key_id<S: Into<String>>(mut self, api_key_id: S) -> Self {
        self.api_key_id = Some(api_key_id.into());
        self
    }

    pub fn with_profile_id<S: Into<String>>(mut self, profile_id: S) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    pub fn with_client_ip<S: Into<String>>(mut self, client_ip: S) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    pub fn with_age_verified(mut self, verified: bool) -> Self {
        self.age_verified = Some(verified);
        self
    }

    pub fn with_prior_violations(mut self, count: u32) -> Self {
        self.prior_violations = Some(count);
        self
    }

    pub fn with_tool_call(mut self, tool_call: ToolCall) -> Self {
        self.tool_call = Some(tool_call);
        self
    }

    pub fn with_tool_access(mut self, request: ToolAccessRequest) -> Self {
        self.tool_access = Some(request);
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tokens_used(mut self, tokens: u64) -> Self {
        self.tokens_used = Some(tokens);
        self
    }

    pub fn with_estimated_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = Some(cost);
        self
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }

    pub fn with_telemetry_opt_out(mut self, opt_out: bool) -> Self {
        self.telemetry_opt_out = Some(opt_out);
        self
    }

    pub fn with_credential_leak_suspected(mut self, suspected: bool) -> Self {
        self.credential_leak_suspected = Some(suspected);
        self
    }

    pub fn with_key_compromised(mut self, compromised: bool) -> Self {
        self.key_compromised = Some(compromised);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_has_no_facts() {
        let ctx = ValidationContext::new(ValidationType::Input);
        assert!(ctx.user_id.is_none());
        assert!(ctx.tool_call.is_none());
        assert!(ctx.age_verified.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let ctx = ValidationContext::new(ValidationType::Input)
            .with_user_id("u-1")
            .with_api_key_id("k-1")
            .with_prior_violations(2)
            .with_tool_call(ToolCall::new("file_write", serde_json::json!({"path": "/tmp/x"})));

        assert_eq!(ctx.user_id.as_deref(), Some("u-1"));
        assert_eq!(ctx.api_key_id.as_deref(), Some("k-1"));
        assert_eq!(ctx.prior_violations, Some(2));
        assert_eq!(ctx.tool_call.as_ref().unwrap().name, "file_write");
    }

    #[test]
    fn test_absent_fields_not_serialized() {
        let ctx = ValidationContext::new(ValidationType::Output);
        let json = serde_json::to_value(&ctx).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.get("validation_type").unwrap(), "output");
        assert!(!obj.contains_key("user_id"));
        assert!(!obj.contains_key("age_verified"));
    }
}
