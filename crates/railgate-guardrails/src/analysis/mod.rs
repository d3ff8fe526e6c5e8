//! Reusable decision algorithms shared by the built-in guardrails:
//! obfuscation-resistant text normalization, tiered pattern matching, and
//! confidence-weighted ensemble scoring.

pub mod normalize;
pub mod scoring;
pub mod tiered;
