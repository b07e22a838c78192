//! Calibrated linear classifier
//!
//! ```text
//! z_i       = (x_i - mean_i) / max(std_i, 1e-8)
//! raw_logit = Σ w_i · z_i + bias
//! p_ai      = sigmoid(calib_a · raw_logit + calib_b)
//! ```
//!
//! `p_ai` is clamped to `[1e-6, 1 - 1e-6]` so downstream code never sees an
//! exact 0 or 1.

use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::model::ClassifierModel;
use std::sync::Arc;

/// Floor on a feature's standard deviation
const STD_EPSILON: f64 = 1e-8;

/// Distance of `p_ai` from 0 and 1
const PROBABILITY_MARGIN: f64 = 1e-6;

/// Classifier output plus the intermediates the explainer needs
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Calibrated probability the clip is AI-generated
    pub p_ai: f64,
    /// `sigmoid(raw_logit)`, before calibration
    pub raw_probability: f64,
    pub raw_logit: f64,
    pub standardized: [f64; FEATURE_COUNT],
    /// `w_i · z_i` per feature
    pub contributions: [f64; FEATURE_COUNT],
}

/// Numerically stable logistic function
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

pub struct Classifier {
    model: Arc<ClassifierModel>,
}

impl Classifier {
    /// The model must already be validated (see [`ClassifierModel::validate`])
    pub fn new(model: Arc<ClassifierModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }

    pub fn predict(&self, features: &FeatureVector) -> Prediction {
        let m = &self.model;
        let mut standardized = [0.0; FEATURE_COUNT];
        let mut contributions = [0.0; FEATURE_COUNT];

        for (i, &x) in features.values().iter().enumerate() {
            let z = (x - m.mean[i]) / m.std[i].max(STD_EPSILON);
            standardized[i] = z;
            contributions[i] = m.weights[i] * z;
        }

        let raw_logit = contributions.iter().sum::<f64>() + m.bias;
        let calibrated = sigmoid(m.calib_a * raw_logit + m.calib_b);
        // NaN only if the logit overflowed to ∞ - ∞; treat it as undecided
        let p_ai = if calibrated.is_nan() {
            0.5
        } else {
            calibrated.clamp(PROBABILITY_MARGIN, 1.0 - PROBABILITY_MARGIN)
        };

        Prediction {
            p_ai,
            raw_probability: sigmoid(raw_logit),
            raw_logit,
            standardized,
            contributions,
        }
    }
}
