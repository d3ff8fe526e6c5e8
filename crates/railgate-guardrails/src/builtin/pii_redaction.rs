//! PII redaction guardrail
//!
//! Detects emails, US SSNs, phone numbers, and card numbers in model
//! output. Findings produce a MODIFY result carrying the redacted text
//! (placeholders per kind); with redaction disabled they produce a warning
//! instead. Detection counts per kind always land in metadata.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::context::ValidationContext;
use crate::guardrail::{Guardrail, GuardrailCategory};
use crate::result::{GuardrailResult, Severity};
use crate::{GuardrailError, Result};

pub const NAME: &str = "PiiRedaction";

struct Detector {
    kind: &'static str,
    pattern: Regex,
}

/// Configuration for [`PiiRedaction`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiRedactionConfig {
    /// Emit MODIFY with redacted text; when false, warn instead
    #[serde(default = "default_true")]
    pub redact: bool,

    /// Detector kinds to run; empty means all
    #[serde(default)]
    pub kinds: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for PiiRedactionConfig {
    fn default() -> Self {
        Self {
            redact: true,
            kinds: Vec::new(),
        }
    }
}

const KNOWN_KINDS: &[&str] = &["email", "ssn", "phone", "card"];

/// Regex-based PII detector and redactor.
pub struct PiiRedaction {
    detectors: Vec<Detector>,
    redact: bool,
}

impl PiiRedaction {
    pub fn new(config: PiiRedactionConfig) -> Result<Self> {
        for kind in &config.kinds {
            if !KNOWN_KINDS.contains(&kind.as_str()) {
                return Err(GuardrailError::config(format!(
                    "unknown PII kind '{kind}' (expected one of {})",
                    KNOWN_KINDS.join(", ")
                )));
            }
        }

        let enabled = |kind: &str| config.kinds.is_empty() || config.kinds.iter().any(|k| k == kind);

        let mut detectors = Vec::new();
        let catalogue: &[(&'static str, &str)] = &[
            ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
            ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
            ("phone", r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b"),
            ("card", r"\b(?:\d[ -]?){13,16}\b"),
        ];

        for (kind, source) in catalogue {
            if enabled(kind) {
                let pattern = Regex::new(source).map_err(|e| GuardrailError::InvalidPattern {
                    pattern: (*source).to_string(),
                    source: e,
                })?;
                detectors.push(Detector { kind, pattern });
            }
        }

        Ok(Self {
            detectors,
            redact: config.redact,
        })
    }

    /// Redact every detected span, returning the counts per kind.
    fn scrub(&self, text: &str) -> (String, BTreeMap<&'static str, usize>) {
        let mut counts = BTreeMap::new();
        let mut scrubbed = text.to_string();

        for detector in &self.detectors {
            let found = detector.pattern.find_iter(&scrubbed).count();
            if found > 0 {
                counts.insert(detector.kind, found);
                let placeholder = format!("[REDACTED:{}]", detector.kind);
                scrubbed = detector
                    .pattern
                    .replace_all(&scrubbed, placeholder.as_str())
                    .into_owned();
            }
        }

        (scrubbed, counts)
    }
}

#[async_trait]
impl Guardrail for PiiRedaction {
    fn name(&self) -> &str {
        NAME
    }

    fn category(&self) -> GuardrailCategory {
        GuardrailCategory::Output
    }

    async fn execute(
        &self,
        content: &str,
        _context: &ValidationContext,
    ) -> Result<GuardrailResult> {
        let (scrubbed, counts) = self.scrub(content);

        if counts.is_empty() {
            return Ok(GuardrailResult::allow(NAME, "no personal data detected"));
        }

        let total: usize = counts.values().sum();
        let kinds_meta = json!(counts
            .iter()
            .map(|(kind, count)| json!({ "kind": kind, "count": count }))
            .collect::<Vec<_>>());

        let result = if self.redact {
            GuardrailResult::modify(
                NAME,
                format!("{total} personal data finding(s) redacted"),
                scrubbed,
            )
        } else {
            GuardrailResult::warn(
                NAME,
                Severity::Warning,
                format!("{total} personal data finding(s) detected"),
            )
        };

        Ok(result.with_metadata("findings", kinds_meta))
    }
}
