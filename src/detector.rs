//! End-to-end analysis
//!
//! [`Detector`] wires the stages together:
//!
//! ```text
//! AudioBuffer ─┬─▶ AudioQualityAssessor ─────────────────────────┐
//!              └─▶ FeatureExtractor ─▶ Classifier ─▶ p_ai ───────┴─▶ ConfidenceAdjuster ─▶ Explainer
//! ```
//!
//! Quality assessment and feature extraction are independent and run side
//! by side. The model is held behind an `Arc` and never mutated, so one
//! detector can serve any number of threads.

use crate::audio::{self, AudioBuffer};
use crate::classifier::Classifier;
use crate::confidence::{Classification, ConfidenceAdjuster, ConfidenceCategory};
use crate::config::DetectorConfig;
use crate::error::{AnalysisError, ConfigError};
use crate::explain::Explainer;
use crate::features::{FeatureExtractor, FeatureVector};
use crate::language::Language;
use crate::model::ClassifierModel;
use crate::quality::{AudioQualityAssessor, QualityMetrics};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Outcome of analyzing one clip
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub classification: Classification,
    /// `max(p, 1 - p)` of the adjusted probability, in [0.5, 1]
    pub confidence_score: f64,
    pub confidence_category: ConfidenceCategory,
    /// Adjusted probability that the clip is AI-generated
    #[serde(rename = "aiProbability")]
    pub p_ai: f64,
    pub explanation: String,
    pub audio_quality: QualityMetrics,
    pub language: Language,
    pub features: FeatureVector,
}

/// One batch input; decode failures are passed through as errors
pub type BatchItem = Result<AudioBuffer, AnalysisError>;

/// Counts over a batch of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_processed: usize,
    pub total_failed: usize,
}

impl BatchSummary {
    pub fn from_results<T, E>(results: &[Result<T, E>]) -> Self {
        Self {
            total_processed: results.len(),
            total_failed: results.iter().filter(|r| r.is_err()).count(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.total_processed - self.total_failed
    }
}

pub struct Detector {
    model: Arc<ClassifierModel>,
    assessor: AudioQualityAssessor,
    extractor: FeatureExtractor,
    classifier: Classifier,
    adjuster: ConfidenceAdjuster,
    explainer: Explainer,
}

impl Detector {
    /// Build a detector, rejecting an invalid configuration or a model that
    /// does not match the feature schema
    pub fn new(model: Arc<ClassifierModel>, config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        model.validate()?;

        Ok(Self {
            assessor: AudioQualityAssessor::new(config.quality),
            extractor: FeatureExtractor::new(config.features),
            classifier: Classifier::new(Arc::clone(&model)),
            adjuster: ConfidenceAdjuster::new(config.confidence),
            explainer: Explainer::new(config.explanation),
            model,
        })
    }

    /// Detector with the built-in model and default configuration
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(Arc::new(ClassifierModel::builtin()), DetectorConfig::default())
    }

    pub fn model(&self) -> &Arc<ClassifierModel> {
        &self.model
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify one clip
    pub fn analyze(
        &self,
        audio: &AudioBuffer,
        language: Language,
    ) -> Result<ClassificationResult, AnalysisError> {
        if audio.is_empty() {
            return Err(AnalysisError::EmptyAudio);
        }
        if audio.sample_rate() == 0 {
            return Err(AnalysisError::ZeroSampleRate);
        }

        let (quality, features) = rayon::join(
            || self.assessor.assess(audio),
            || self.extractor.extract(audio),
        );

        let prediction = self.classifier.predict(&features);
        let adjusted =
            self.adjuster
                .adjust(prediction.p_ai, &quality, language, self.model.primary_language);
        let explanation = self
            .explainer
            .explain(&prediction.contributions, adjusted.classification);

        tracing::debug!(
            duration = quality.duration_seconds,
            sample_rate = quality.sample_rate,
            quality = quality.quality_score,
            raw_logit = prediction.raw_logit,
            p_ai = prediction.p_ai,
            adjusted = adjusted.p_ai,
            classification = %adjusted.classification,
            "analyzed clip"
        );

        Ok(ClassificationResult {
            classification: adjusted.classification,
            confidence_score: adjusted.confidence_score,
            confidence_category: adjusted.category,
            p_ai: adjusted.p_ai,
            explanation,
            audio_quality: quality,
            language,
            features,
        })
    }

    /// Decode a file and classify it
    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        path: P,
        language: Language,
    ) -> Result<ClassificationResult, AnalysisError> {
        let audio = audio::decode_file(path)?;
        self.analyze(&audio, language)
    }

    /// Classify many clips in parallel
    ///
    /// Returns exactly one result per item, in input order. A failed item
    /// (decode error passed in, or an empty buffer) yields an error at its
    /// own position and does not affect the others.
    pub fn analyze_batch(
        &self,
        items: Vec<BatchItem>,
        language: Language,
    ) -> Vec<Result<ClassificationResult, AnalysisError>> {
        let results: Vec<_> = items
            .into_par_iter()
            .enumerate()
            .map(|(index, item)| {
                let result = item.and_then(|audio| self.analyze(&audio, language));
                if let Err(ref e) = result {
                    tracing::warn!(index, error = %e, "batch item failed");
                }
                result
            })
            .collect();

        let summary = BatchSummary::from_results(&results);
        tracing::debug!(
            total_processed = summary.total_processed,
            total_failed = summary.total_failed,
            "batch complete"
        );
        results
    }
}
