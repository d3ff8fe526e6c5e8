//! NSFW content guardrail
//!
//! Confidence-weighted ensemble over a tiered term catalogue. Medical,
//! educational, and clinical framing dampens every signal; prior violations
//! and explicit-intent markers amplify them. Age verification exempts the
//! contextual tier from blocking (downgraded to a warning) but never the
//! explicit tier. The full signal breakdown is attached to every result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analysis::normalize::{deobfuscate, normalize};
use crate::analysis::scoring::{score_signals, ContextModifier, Signal, TierThresholds};
use crate::analysis::tiered::Tier;
use crate::context::ValidationContext;
use crate::guardrail::{Guardrail, GuardrailCategory};
use crate::result::{GuardrailResult, Severity};
use crate::Result;

pub const NAME: &str = "NsfwContent";

/// One catalogue entry: a term, the tier it signals, and its confidence.
struct TermDef {
    term: &'static str,
    tier: Tier,
    confidence: f64,
}

static TERMS: &[TermDef] = &[
    TermDef { term: "explicit sexual content", tier: Tier::Explicit, confidence: 0.9 },
    TermDef { term: "hardcore pornography", tier: Tier::Explicit, confidence: 0.95 },
    TermDef { term: "sexually explicit", tier: Tier::Explicit, confidence: 0.85 },
    TermDef { term: "pornographic", tier: Tier::Contextual, confidence: 0.7 },
    TermDef { term: "nude photos", tier: Tier::Contextual, confidence: 0.6 },
    TermDef { term: "erotic story", tier: Tier::Contextual, confidence: 0.55 },
    TermDef { term: "adult content", tier: Tier::Contextual, confidence: 0.45 },
    TermDef { term: "suggestive", tier: Tier::Restricted, confidence: 0.3 },
    TermDef { term: "risque", tier: Tier::Restricted, confidence: 0.25 },
];

/// Phrases that indicate a legitimate professional or educational framing.
static EXEMPTION_INDICATORS: &[&str] = &[
    "medical", "anatomy", "clinical", "health education", "biology",
    "reproductive health", "academic",
];

/// Phrases that indicate deliberate intent to obtain explicit material.
static INTENT_MARKERS: &[&str] = &["uncensored", "nsfw", "no filter", "x-rated"];

/// Configuration for [`NsfwContent`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsfwConfig {
    /// Per-tier aggregate thresholds
    #[serde(default)]
    pub thresholds: TierThresholds,

    /// Whether `age_verified` downgrades a contextual block to a warning
    #[serde(default = "default_true")]
    pub honor_age_verification: bool,

    /// Dampening factor applied when exemption indicators are present
    #[serde(default = "default_exemption_dampen")]
    pub exemption_dampen: f64,
}

fn default_true() -> bool {
    true
}

fn default_exemption_dampen() -> f64 {
    0.5
}

impl Default for NsfwConfig {
    fn default() -> Self {
        Self {
            thresholds: TierThresholds::default(),
            honor_age_verification: true,
            exemption_dampen: default_exemption_dampen(),
        }
    }
}

/// Ensemble-scored NSFW detector.
pub struct NsfwContent {
    config: NsfwConfig,
}

impl NsfwContent {
    pub fn new(config: NsfwConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.exemption_dampen) {
            return Err(crate::GuardrailError::config(
                "exemption_dampen must be within [0, 1]",
            ));
        }
        Ok(Self { config })
    }

    fn collect_signals(&self, text: &str) -> Vec<Signal> {
        TERMS
            .iter()
            .filter(|def| text.contains(def.term))
            .map(|def| {
                Signal::new(
                    match def.tier {
                        Tier::Explicit => "explicit_term",
                        Tier::Contextual => "contextual_term",
                        Tier::Restricted => "restricted_term",
                    },
                    def.confidence,
                    def.tier,
                    vec![def.term.to_string()],
                )
            })
            .collect()
    }

    fn modifier_for(&self, text: &str, context: &ValidationContext) -> ContextModifier {
        let mut modifier = ContextModifier::neutral();

        if EXEMPTION_INDICATORS.iter().any(|ind| text.contains(ind)) {
            modifier = modifier.with_dampen(self.config.exemption_dampen);
        }

        let mut amplify = 1.0;
        if let Some(violations) = context.prior_violations {
            if violations > 0 {
                amplify += 0.1 * violations.min(5) as f64;
            }
        }
        if INTENT_MARKERS.iter().any(|marker| text.contains(marker)) {
            amplify += 0.25;
        }
        if amplify > 1.0 {
            modifier = modifier.with_amplify(amplify);
        }

        modifier
    }
}

#[async_trait]
impl Guardrail for NsfwContent {
    fn name(&self) -> &str {
        NAME
    }

    fn category(&self) -> GuardrailCategory {
        GuardrailCategory::General
    }

    async fn execute(
        &self,
        content: &str,
        context: &ValidationContext,
    ) -> Result<GuardrailResult> {
        let scan_text = deobfuscate(&normalize(content));
        let signals = self.collect_signals(&scan_text);
        let modifier = self.modifier_for(&scan_text, context);
        let outcome = score_signals(signals, modifier, &self.config.thresholds);

        let age_exempt =
            self.config.honor_age_verification && context.age_verified == Some(true);

        let result = match outcome.decided_tier {
            Some(Tier::Explicit) => GuardrailResult::block(
                NAME,
                Severity::Critical,
                "explicit sexual content detected",
            ),
            Some(Tier::Contextual) if age_exempt => GuardrailResult::warn(
                NAME,
                Severity::Warning,
                "adult-oriented content allowed for age-verified user",
            ),
            Some(Tier::Contextual) => GuardrailResult::block(
                NAME,
                Severity::Error,
                "adult-oriented content detected",
            ),
            Some(Tier::Restricted) => GuardrailResult::warn(
                NAME,
                Severity::Info,
                "mildly suggestive content detected",
            ),
            None => GuardrailResult::allow(NAME, "no objectionable content detected"),
        };

        Ok(result
            .with_metadata("scoring", outcome.to_metadata())
            .with_metadata("age_exempt", json!(age_exempt)))
    }
}
