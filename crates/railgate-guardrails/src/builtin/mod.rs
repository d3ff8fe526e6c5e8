//! Built-in guardrails registered by [`crate::registry::GuardrailRegistry::bootstrap`].

pub mod credential_leak;
pub mod destructive_ops;
pub mod file_write;
pub mod model_pin;
pub mod nsfw;
pub mod pii_redaction;
pub mod prompt_injection;
pub mod rate_limit;
pub mod tool_access;

pub use credential_leak::CredentialLeak;
pub use destructive_ops::DestructiveOperation;
pub use file_write::FileWriteRestriction;
pub use model_pin::ModelPinning;
pub use nsfw::NsfwContent;
pub use pii_redaction::PiiRedaction;
pub use prompt_injection::PromptInjectionSignature;
pub use rate_limit::{ApiRateLimit, RateLimitStore};
pub use tool_access::ToolAccess;
