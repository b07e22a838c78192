//! Confidence adjustment and labelling
//!
//! Turns a calibrated `p_ai` into the final verdict:
//!
//! 1. Unreliable input (short clip or suspect sample rate) pulls `p_ai`
//!    toward 0.5 by `reliability_shrinkage`, and the distance left over is
//!    scaled by the clip's quality score. A confident prediction on a usable
//!    short clip keeps its label at lower confidence; an unusable clip
//!    (silence, quality score 0) collapses to 0.5.
//! 2. A request language other than the model's primary language scales the
//!    remaining distance from 0.5 by `language_mismatch_weight`.
//! 3. `confidence_score = max(p, 1 - p)`.
//! 4. The score is mapped to a display [`ConfidenceCategory`] and,
//!    independently, to a [`Classification`].
//!
//! | Score | Category | Classification (defaults) |
//! |-------|----------|---------------------------|
//! | `< 0.6` | low | BORDERLINE |
//! | `0.6 ..< 0.8` | medium | AI_GENERATED / HUMAN |
//! | `>= 0.8` | high | AI_GENERATED / HUMAN |
//!
//! Every lower bound is inclusive: a score of exactly 0.6 is "medium" and
//! not BORDERLINE.

use crate::config::ConfidenceConfig;
use crate::language::Language;
use crate::quality::QualityMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    AiGenerated,
    Human,
    Borderline,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "AI_GENERATED",
            Classification::Human => "HUMAN",
            Classification::Borderline => "BORDERLINE",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceCategory {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceCategory::Low => "low",
            ConfidenceCategory::Medium => "medium",
            ConfidenceCategory::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjusted {
    /// `p_ai` after the reliability and language discounts
    pub p_ai: f64,
    pub confidence_score: f64,
    pub category: ConfidenceCategory,
    pub classification: Classification,
}

pub struct ConfidenceAdjuster {
    config: ConfidenceConfig,
}

impl ConfidenceAdjuster {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    pub fn adjust(
        &self,
        p_ai: f64,
        quality: &QualityMetrics,
        requested: Language,
        primary: Language,
    ) -> Adjusted {
        let p = if p_ai.is_finite() { p_ai.clamp(0.0, 1.0) } else { 0.5 };
        let mut distance = p - 0.5;

        if quality.is_unreliable() {
            let score = if quality.quality_score.is_finite() {
                quality.quality_score.clamp(0.0, 1.0)
            } else {
                0.0
            };
            distance *= (1.0 - self.config.reliability_shrinkage) * score;
        }
        if requested != primary {
            distance *= self.config.language_mismatch_weight;
        }

        let p = (0.5 + distance).clamp(0.0, 1.0);
        let confidence_score = p.max(1.0 - p);

        Adjusted {
            p_ai: p,
            confidence_score,
            category: self.category(confidence_score),
            classification: self.classify(p, confidence_score),
        }
    }

    pub fn category(&self, score: f64) -> ConfidenceCategory {
        if score >= self.config.category_high {
            ConfidenceCategory::High
        } else if score >= self.config.category_medium {
            ConfidenceCategory::Medium
        } else {
            ConfidenceCategory::Low
        }
    }

    pub fn classify(&self, p_ai: f64, score: f64) -> Classification {
        if score < self.config.borderline_threshold {
            Classification::Borderline
        } else if p_ai >= 0.5 {
            Classification::AiGenerated
        } else {
            Classification::Human
        }
    }
}
