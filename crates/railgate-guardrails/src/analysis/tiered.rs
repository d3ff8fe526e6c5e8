//! Tiered pattern matching
//!
//! Detection rules live in static catalogues grouped into severity tiers.
//! A compiled matcher scans every obfuscation-resistant form of the text
//! with a `RegexSet`, keeping per-pattern regexes alongside for match
//! extraction. The tier decision ladder:
//!
//! * any Explicit match blocks outright;
//! * a Contextual match blocks only when its confidence clears the
//!   configured threshold and no exemption applies, otherwise warns;
//! * a Restricted match warns when configured to, otherwise allows.

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::analysis::normalize::match_forms;
use crate::error::{GuardrailError, Result};
use crate::result::{GuardrailAction, Severity};

/// Severity tier a detection rule belongs to, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Unambiguous policy violations
    Explicit,
    /// Suspicious in most contexts, judged by confidence
    Contextual,
    /// Worth flagging at most
    Restricted,
}

/// A single detection rule in a catalogue
pub struct PatternDef {
    /// Short snake_case identifier used in findings and logs
    pub name: &'static str,
    /// Severity tier
    pub tier: Tier,
    /// How strongly a hit indicates a violation, in [0, 1]
    pub confidence: f64,
    /// Regex source, compiled at matcher construction
    pub pattern: &'static str,
}

/// A match produced by the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierMatch {
    pub pattern_name: String,
    pub tier: Tier,
    pub confidence: f64,
    /// The literal substring that triggered the match
    pub matched_text: String,
}

/// Catalogue compiled for scanning: a `RegexSet` to find which patterns hit,
/// plus parallel individual regexes for extracting the matched text.
pub struct TieredMatcher {
    set: RegexSet,
    individual: Vec<Regex>,
    defs: &'static [PatternDef],
}

impl TieredMatcher {
    /// Compile a static catalogue. Fails fast on an invalid pattern.
    pub fn new(defs: &'static [PatternDef]) -> Result<Self> {
        let sources: Vec<&str> = defs.iter().map(|d| d.pattern).collect();

        let set = RegexSet::new(&sources).map_err(|e| {
            GuardrailError::config(format!("pattern catalogue failed to compile: {e}"))
        })?;

        let individual = defs
            .iter()
            .map(|d| {
                Regex::new(d.pattern).map_err(|source| GuardrailError::InvalidPattern {
                    pattern: d.pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            set,
            individual,
            defs,
        })
    }

    /// Number of patterns in the compiled catalogue
    pub fn pattern_count(&self) -> usize {
        self.defs.len()
    }

    /// Scan one text form, returning a match per hitting pattern.
    pub fn scan(&self, text: &str) -> Vec<TierMatch> {
        let mut matches = Vec::new();

        for idx in self.set.matches(text).into_iter() {
            let def = &self.defs[idx];
            if let Some(m) = self.individual[idx].find(text) {
                matches.push(TierMatch {
                    pattern_name: def.name.to_string(),
                    tier: def.tier,
                    confidence: def.confidence,
                    matched_text: m.as_str().to_string(),
                });
            }
        }

        matches
    }

    /// Scan the raw text and its normalized/deobfuscated forms, deduplicated
    /// by pattern name and ordered by tier (highest first).
    pub fn scan_all_forms(&self, text: &str) -> Vec<TierMatch> {
        let mut matches: Vec<TierMatch> = Vec::new();

        for form in match_forms(text) {
            for m in self.scan(&form) {
                if !matches.iter().any(|seen| seen.pattern_name == m.pattern_name) {
                    matches.push(m);
                }
            }
        }

        matches.sort_by(|a, b| a.tier.cmp(&b.tier));
        matches
    }
}

/// Knobs for the tier decision ladder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierPolicy {
    /// Contextual matches at or above this confidence block (absent an
    /// exemption); below it they warn
    #[serde(default = "default_contextual_threshold")]
    pub contextual_block_threshold: f64,

    /// Whether Restricted matches produce a warning instead of passing
    #[serde(default)]
    pub flag_restricted: bool,
}

fn default_contextual_threshold() -> f64 {
    0.7
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            contextual_block_threshold: default_contextual_threshold(),
            flag_restricted: false,
        }
    }
}

/// The decision for a set of tier matches
#[derive(Debug, Clone, PartialEq)]
pub struct TierOutcome {
    pub action: GuardrailAction,
    pub severity: Severity,
    /// Highest tier that drove the decision, if any pattern matched
    pub decided_tier: Option<Tier>,
    /// Confidence of the strongest match in the deciding tier
    pub confidence: f64,
}

/// Apply the tier decision ladder to a set of matches.
///
/// `exempt` suppresses the Contextual block (e.g. the caller verified the
/// user's age); Explicit matches are never exempt.
pub fn evaluate_tiers(matches: &[TierMatch], policy: &TierPolicy, exempt: bool) -> TierOutcome {
    if let Some(top) = matches.iter().find(|m| m.tier == Tier::Explicit) {
        return TierOutcome {
            action: GuardrailAction::Block,
            severity: Severity::Critical,
            decided_tier: Some(Tier::Explicit),
            confidence: top.confidence,
        };
    }

    let contextual_max = matches
        .iter()
        .filter(|m| m.tier == Tier::Contextual)
        .map(|m| m.confidence)
        .fold(None::<f64>, |acc, c| Some(acc.map_or(c, |a| a.max(c))));

    if let Some(confidence) = contextual_max {
        let blocks = confidence >= policy.contextual_block_threshold && !exempt;
        return TierOutcome {
            action: if blocks {
                GuardrailAction::Block
            } else {
                GuardrailAction::Warn
            },
            severity: if blocks {
                Severity::Error
            } else {
                Severity::Warning
            },
            decided_tier: Some(Tier::Contextual),
            confidence,
        };
    }

    if let Some(low) = matches.iter().find(|m| m.tier == Tier::Restricted) {
        if policy.flag_restricted {
            return TierOutcome {
                action: GuardrailAction::Warn,
                severity: Severity::Info,
                decided_tier: Some(Tier::Restricted),
                confidence: low.confidence,
            };
        }
        return TierOutcome {
            action: GuardrailAction::Allow,
            severity: Severity::Info,
            decided_tier: Some(Tier::Restricted),
            confidence: low.confidence,
        };
    }

    TierOutcome {
        action: GuardrailAction::Allow,
        severity: Severity::Info,
        decided_tier: None,
        confidence: 0.0,
    }
}
