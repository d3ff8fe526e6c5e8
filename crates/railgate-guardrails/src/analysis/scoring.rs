//! Confidence-weighted ensemble scoring
//!
//! Each matched rule emits a signal carrying a confidence in [0, 1] and a
//! tier. Signals are summed per tier after a multiplicative context
//! modifier (domain exemptions dampen, risk indicators amplify), and the
//! first tier — walking from most to least severe — whose aggregate clears
//! its threshold decides the outcome. The full breakdown is always exported
//! for the result's metadata; explainability is part of the contract, not
//! optional logging.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::tiered::Tier;

/// One weighted detection signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// What kind of rule emitted this (e.g. `"explicit_term"`)
    pub signal_type: String,
    /// Strength of the signal in [0, 1]
    pub confidence: f64,
    /// Tier the emitting rule belongs to
    pub tier: Tier,
    /// Terms that triggered the rule
    pub matched_terms: Vec<String>,
}

impl Signal {
    pub fn new(
        signal_type: impl Into<String>,
        confidence: f64,
        tier: Tier,
        matched_terms: Vec<String>,
    ) -> Self {
        Self {
            signal_type: signal_type.into(),
            confidence: confidence.clamp(0.0, 1.0),
            tier,
            matched_terms,
        }
    }
}

/// Multiplicative adjustment derived from context before aggregation.
///
/// `dampen` is at most 1 (domain exemptions such as medical or educational
/// framing), `amplify` at least 1 (risk indicators such as prior
/// violations). The effective modifier is their product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextModifier {
    pub dampen: f64,
    pub amplify: f64,
}

impl ContextModifier {
    pub fn neutral() -> Self {
        Self {
            dampen: 1.0,
            amplify: 1.0,
        }
    }

    pub fn with_dampen(mut self, factor: f64) -> Self {
        self.dampen = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_amplify(mut self, factor: f64) -> Self {
        self.amplify = factor.max(1.0);
        self
    }

    pub fn factor(&self) -> f64 {
        self.dampen * self.amplify
    }
}

impl Default for ContextModifier {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Per-tier aggregate thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_explicit_threshold")]
    pub explicit: f64,
    #[serde(default = "default_contextual_threshold")]
    pub contextual: f64,
    #[serde(default = "default_restricted_threshold")]
    pub restricted: f64,
}

fn default_explicit_threshold() -> f64 {
    0.5
}

fn default_contextual_threshold() -> f64 {
    0.8
}

fn default_restricted_threshold() -> f64 {
    1.2
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            explicit: default_explicit_threshold(),
            contextual: default_contextual_threshold(),
            restricted: default_restricted_threshold(),
        }
    }
}

impl TierThresholds {
    fn for_tier(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Explicit => self.explicit,
            Tier::Contextual => self.contextual,
            Tier::Restricted => self.restricted,
        }
    }
}

/// The aggregated decision plus everything needed to explain it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleOutcome {
    /// First tier (in descending severity) whose aggregate cleared its
    /// threshold; `None` when nothing did
    pub decided_tier: Option<Tier>,
    /// Aggregate score of the deciding tier (0 when none decided)
    pub confidence: f64,
    /// Modified aggregate per tier, in severity order
    pub tier_scores: Vec<(Tier, f64)>,
    /// The effective context modifier applied to every signal
    pub modifier: f64,
    /// The contributing signals, in emission order
    pub signals: Vec<Signal>,
}

impl EnsembleOutcome {
    /// Serialize the full decision breakdown for a result's metadata map.
    pub fn to_metadata(&self) -> Value {
        json!({
            "decided_tier": self.decided_tier,
            "confidence": self.confidence,
            "tier_scores": self.tier_scores
                .iter()
                .map(|(tier, score)| json!({ "tier": tier, "score": score }))
                .collect::<Vec<_>>(),
            "context_modifier": self.modifier,
            "signals": self.signals,
        })
    }
}

/// Aggregate signals per tier under a context modifier and pick the
/// deciding tier.
///
/// Deterministic: signals are folded in the order given, tiers walked in
/// fixed severity order, ties broken toward the higher-severity tier by the
/// walk itself.
pub fn score_signals(
    signals: Vec<Signal>,
    modifier: ContextModifier,
    thresholds: &TierThresholds,
) -> EnsembleOutcome {
    const TIER_ORDER: [Tier; 3] = [Tier::Explicit, Tier::Contextual, Tier::Restricted];

    let factor = modifier.factor();

    let tier_scores: Vec<(Tier, f64)> = TIER_ORDER
        .iter()
        .map(|&tier| {
            let sum: f64 = signals
                .iter()
                .filter(|s| s.tier == tier)
                .map(|s| s.confidence * factor)
                .sum();
            (tier, sum)
        })
        .collect();

    let decided = tier_scores
        .iter()
        .find(|(tier, score)| *score >= thresholds.for_tier(*tier) && *score > 0.0)
        .copied();

    EnsembleOutcome {
        decided_tier: decided.map(|(tier, _)| tier),
        confidence: decided.map(|(_, score)| score).unwrap_or(0.0),
        tier_scores,
        modifier: factor,
        signals,
    }
}
