//! Voxguard - Detect AI-synthesized speech
//!
//! Voxguard classifies a short speech clip as AI-generated or human-spoken
//! (English, Hindi, Tamil, Malayalam, Telugu) from hand-engineered acoustic
//! features and a calibrated linear model.
//!
//! # Overview
//!
//! Speech synthesizers are very good at the words and much less good at the
//! accidents of a human voice: pitch wobbles, micro-jitter, breathing
//! pauses, shifting timbre, noisy phonation. Voxguard measures those
//! accidents and asks how many are missing.
//!
//! # Pipeline
//!
//! 1. **Quality** ([`quality`]): duration, sample rate, amplitude. Bad input
//!    is flagged, not rejected.
//! 2. **Features** ([`features`]): 13 values in one canonical, versioned
//!    order (pitch stability, jitter, HNR, spectral flatness, MFCC
//!    variance, energy dynamics, onsets, rolloff, phase coherence, pauses,
//!    voiced ratio).
//! 3. **Classifier** ([`classifier`]): standardize, dot with weights,
//!    Platt-calibrated sigmoid.
//! 4. **Confidence** ([`confidence`]): pull unreliable or off-language
//!    clips toward 0.5, then label.
//! 5. **Explanation** ([`explain`]): the strongest agreeing features as a
//!    sentence.
//!
//! # Quick Start
//!
//! ```no_run
//! use voxguard::{Classification, Detector, Language};
//!
//! let detector = Detector::with_defaults()?;
//! let result = detector.analyze_file("clip.wav", Language::English)?;
//!
//! match result.classification {
//!     Classification::AiGenerated => println!("Synthetic: {}", result.explanation),
//!     Classification::Human => println!("Human: {}", result.explanation),
//!     Classification::Borderline => println!("Can't tell: {}", result.explanation),
//! }
//! println!("Confidence: {:.0}% ({})", result.confidence_score * 100.0, result.confidence_category);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Labels
//!
//! | Confidence score | Category | Classification |
//! |------------------|----------|----------------|
//! | 0.5 - <0.6 | low | BORDERLINE |
//! | 0.6 - <0.8 | medium | AI_GENERATED / HUMAN |
//! | 0.8 - 1.0 | high | AI_GENERATED / HUMAN |
//!
//! Both threshold sets are configurable independently ([`config`]).
//!
//! # Modules
//!
//! - [`detector`]: End-to-end pipeline and parallel batches
//! - [`features`]: Feature schema and extraction
//! - [`model`]: Model file loading and validation
//! - [`report`]: Output formatters (JSON, CSV)

pub mod audio;
pub mod classifier;
pub mod confidence;
pub mod config;
pub mod detector;
pub mod error;
pub mod explain;
pub mod features;
pub mod language;
pub mod model;
pub mod quality;
pub mod report;

pub use audio::AudioBuffer;
pub use confidence::{Classification, ConfidenceCategory};
pub use config::DetectorConfig;
pub use detector::{BatchItem, BatchSummary, ClassificationResult, Detector};
pub use error::{AnalysisError, ConfigError, ModelError};
pub use features::{FeatureExtractor, FeatureId, FeatureVector, FEATURE_NAMES, SCHEMA_VERSION};
pub use language::Language;
pub use model::ClassifierModel;
pub use quality::QualityMetrics;
