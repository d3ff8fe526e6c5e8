//! Capability-token tool access guardrail
//!
//! A state machine over a single authorization decision. Each check is
//! independently sufficient to block, and the failing check is named in the
//! result metadata so callers can tell a mismatched token from a weak
//! identity. Without a tool invocation the guardrail passes through; with a
//! tool invocation but no access descriptor it cannot evaluate and allows.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::access::{ToolAccessRequest, ToolPolicySet};
use crate::context::ValidationContext;
use crate::guardrail::{Guardrail, GuardrailCategory};
use crate::result::{GuardrailResult, Severity};
use crate::{GuardrailError, Result};

pub const NAME: &str = "ToolAccess";

/// Configuration for [`ToolAccess`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolAccessConfig {
    /// Per-tool policy table; must not be empty
    #[serde(flatten)]
    pub policy_set: ToolPolicySet,
}

/// Token/identity/policy authorization over privileged tool invocations.
pub struct ToolAccess {
    policy_set: ToolPolicySet,
}

impl ToolAccess {
    pub fn new(config: ToolAccessConfig) -> Result<Self> {
        if config.policy_set.policies.is_empty() && config.policy_set.default_policy.is_none() {
            return Err(GuardrailError::config(
                "tool policy table must not be empty",
            ));
        }
        Ok(Self {
            policy_set: config.policy_set,
        })
    }

    /// Run the check chain; `Err` carries the name of the failing check and
    /// a message.
    fn authorize(
        &self,
        tool_name: &str,
        request: &ToolAccessRequest,
    ) -> std::result::Result<&'static str, (&'static str, String)> {
        let token = &request.token;
        let agent = &request.agent;

        if token.tool != tool_name {
            return Err((
                "token_tool_mismatch",
                format!(
                    "token grants '{}' but '{}' was invoked",
                    token.tool, tool_name
                ),
            ));
        }

        if token.is_expired(Utc::now()) {
            return Err((
                "token_expired",
                format!("token expired at {}", token.expires_at),
            ));
        }

        if !token.allows_action(&request.requested_action) {
            return Err((
                "action_not_granted",
                format!("action '{}' is not granted by the token", request.requested_action),
            ));
        }

        let Some(policy) = self.policy_set.policy_for(tool_name) else {
            return Err((
                "no_policy",
                format!("no access policy covers tool '{tool_name}'"),
            ));
        };

        if !policy.allows_role(&agent.role) {
            return Err((
                "role_not_allowed",
                format!(
                    "role '{}' may not invoke {:?}-sensitivity tools",
                    agent.role, policy.sensitivity
                ),
            ));
        }

        if agent.strength < policy.min_strength {
            return Err((
                "identity_strength",
                format!(
                    "identity strength {:?} is below the required {:?}",
                    agent.strength, policy.min_strength
                ),
            ));
        }

        Ok("authorized")
    }
}

#[async_trait]
impl Guardrail for ToolAccess {
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
            return Ok(GuardrailResult::allow(NAME, "no tool invocation to authorize"));
        };

        let Some(request) = context.tool_access.as_ref() else {
            return Ok(GuardrailResult::allow(
                NAME,
                "no access descriptor in context, cannot evaluate",
            )
            .with_metadata("cannot_evaluate", json!(true))
            .with_metadata("tool", json!(tool_call.name)));
        };

        match self.authorize(&tool_call.name, request) {
            Ok(_) => {
                let sensitivity = self
                    .policy_set
                    .policy_for(&tool_call.name)
                    .map(|p| p.sensitivity);
                Ok(GuardrailResult::allow(
                    NAME,
                    format!("agent '{}' authorized for '{}'", request.agent.agent_id, tool_call.name),
                )
                .with_metadata("tool", json!(tool_call.name))
                .with_metadata("sensitivity", json!(sensitivity)))
            }
            Err((check, message)) => Ok(GuardrailResult::block(NAME, Severity::Error, message)
                .with_metadata("failed_check", json!(check))
                .with_metadata("tool", json!(tool_call.name))
                .with_metadata("agent_id", json!(request.agent.agent_id))),
        }
    }
}
