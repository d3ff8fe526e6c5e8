//! Capability tokens, agent identities, and tool policies
//!
//! These facts arrive with each request and are never persisted by the
//! engine. A capability token is a scoped, time-bounded grant authorizing a
//! specific agent to invoke a specific tool action; the policy table maps
//! each tool onto a sensitivity tier with role and identity-strength
//! requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// How strongly an agent's identity was verified, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrength {
    /// No verification beyond self-assertion
    Unverified,
    /// Credential-backed (API key or similar)
    Basic,
    /// Platform-attested workload identity
    Attested,
    /// Hardware- or authority-certified identity
    Certified,
}

/// How sensitive a tool is, mildest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityTier {
    Low,
    Moderate,
    High,
    Critical,
}

/// A scoped, time-bounded grant for one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityToken {
    /// Tool this token grants access to
    pub tool: String,
    /// Actions the holder may request
    pub allowed_actions: Vec<String>,
    /// Issuer-supplied constraints, opaque to the engine
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub constraints: Map<String, Value>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CapabilityToken {
    pub fn new<S: Into<String>>(
        tool: S,
        allowed_actions: Vec<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tool: tool.into(),
            allowed_actions,
            constraints: Map::new(),
            issued_at,
            expires_at,
        }
    }

    /// Whether the token has expired as of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the token grants `action`
    pub fn allows_action(&self, action: &str) -> bool {
        self.allowed_actions.iter().any(|a| a == action)
    }
}

/// Who is asking to use the tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub agent_id: String,
    /// Role label matched against a policy's allowed roles
    pub role: String,
    /// Verification tier of this identity
    pub strength: IdentityStrength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-tool access requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPolicy {
    /// Sensitivity tier of the tool
    pub sensitivity: SensitivityTier,
    /// Minimum identity strength required at this sensitivity
    pub min_strength: IdentityStrength,
    /// Roles permitted to invoke the tool
    pub allowed_roles: Vec<String>,
}

impl ToolPolicy {
    pub fn allows_role(&self, role: &str) -> bool {
        self.allowed_roles.iter().any(|r| r == role)
    }
}

/// The policy table a `ToolAccess` guardrail is configured with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolPolicySet {
    /// Tool name to policy
    #[serde(default)]
    pub policies: HashMap<String, ToolPolicy>,
    /// Applied to tools absent from `policies`; without it unknown tools
    /// are denied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_policy: Option<ToolPolicy>,
}

impl ToolPolicySet {
    /// Look up the policy governing `tool`
    pub fn policy_for(&self, tool: &str) -> Option<&ToolPolicy> {
        self.policies.get(tool).or(self.default_policy.as_ref())
    }
}

/// Everything needed to authorize one privileged tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolAccessRequest {
    pub agent: AgentIdentity,
    pub token: CapabilityToken,
    /// The action being requested of the tool
    pub requested_action: String,
}
