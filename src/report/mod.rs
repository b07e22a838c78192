//! Report generation for batch results
//!
//! This module provides output formatters for per-file classification results:
//!
//! - **JSON**: Machine-readable format with summary counts and full results
//! - **CSV**: Spreadsheet-compatible format, one row per file
//!
//! # Usage
//!
//! ```ignore
//! use voxguard::report;
//!
//! // Automatically picks format based on extension
//! report::generate("report.json", &entries)?;  // JSON
//! report::generate("report.csv", &entries)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use crate::confidence::Classification;
use crate::detector::{BatchSummary, ClassificationResult};
use crate::error::AnalysisError;
use serde::Serialize;
use std::io;
use std::path::Path;

/// One analyzed file: its result or the reason it failed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_path: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ClassificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: &Path, outcome: Result<ClassificationResult, AnalysisError>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (result, error) = match outcome {
            Ok(r) => (Some(r), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            file_path: path.display().to_string(),
            file_name,
            result,
            error,
        }
    }

    pub fn classification(&self) -> Option<Classification> {
        self.result.as_ref().map(|r| r.classification)
    }
}

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, entries: &[FileReport]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, entries),
        _ => csv::write(&mut file, entries),
    }
}

/// Summary statistics for a batch of results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub ai_generated: usize,
    pub human: usize,
    pub borderline: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_entries(entries: &[FileReport]) -> Self {
        let mut summary = Self::default();
        summary.total = entries.len();

        for e in entries {
            match e.classification() {
                Some(Classification::AiGenerated) => summary.ai_generated += 1,
                Some(Classification::Human) => summary.human += 1,
                Some(Classification::Borderline) => summary.borderline += 1,
                None => summary.error += 1,
            }
        }

        summary
    }

    pub fn batch(&self) -> BatchSummary {
        BatchSummary {
            total_processed: self.total,
            total_failed: self.error,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::AudioBuffer;
    use crate::detector::Detector;
    use crate::language::Language;
    use std::path::PathBuf;

    // ==========================================================================
    // SUMMARY STATISTICS TESTS
    // ==========================================================================
    //
    // The Summary struct aggregates classification counts for a batch of
    // files. This is displayed at the top of reports to give an overview.
    // ==========================================================================

    /// A real result for a steady tone, relabelled as requested
    pub(crate) fn create_test_entry(classification: Option<Classification>, path: &str) -> FileReport {
        let outcome = match classification {
            Some(c) => {
                let samples = (0..48000)
                    .map(|i| (2.0 * std::f64::consts::PI * 200.0 * i as f64 / 16000.0).sin() * 0.3)
                    .collect();
                let detector = Detector::with_defaults().unwrap();
                let mut r = detector
                    .analyze(&AudioBuffer::from_mono(samples, 16000), Language::English)
                    .unwrap();
                r.classification = c;
                Ok(r)
            }
            None => Err(AnalysisError::Decode("unsupported codec".into())),
        };
        FileReport::new(&PathBuf::from(path), outcome)
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_entries(&[]);

        assert_eq!(summary, Summary::default());
        assert_eq!(summary.batch(), BatchSummary::default());
    }

    #[test]
    fn test_summary_mixed() {
        let entries = vec![
            create_test_entry(Some(Classification::AiGenerated), "/clips/a.wav"),
            create_test_entry(Some(Classification::AiGenerated), "/clips/b.wav"),
            create_test_entry(Some(Classification::Human), "/clips/c.wav"),
            create_test_entry(Some(Classification::Borderline), "/clips/d.wav"),
            create_test_entry(None, "/clips/e.mp3"),
        ];
        let summary = Summary::from_entries(&entries);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.ai_generated, 2);
        assert_eq!(summary.human, 1);
        assert_eq!(summary.borderline, 1);
        assert_eq!(summary.error, 1);
        assert_eq!(
            summary.batch(),
            BatchSummary {
                total_processed: 5,
                total_failed: 1
            }
        );
    }

    #[test]
    fn test_summary_all_errors() {
        // Worst case: nothing could be decoded
        let entries = vec![create_test_entry(None, "/x.ogg"), create_test_entry(None, "/y.ogg")];
        let summary = Summary::from_entries(&entries);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.error, 2);
        assert_eq!(summary.batch().succeeded(), 0);
    }

    // ==========================================================================
    // FILE ENTRY TESTS
    // ==========================================================================

    #[test]
    fn test_file_report_names() {
        let entry = create_test_entry(None, "/clips/deep/voice.flac");
        assert_eq!(entry.file_name, "voice.flac");
        assert_eq!(entry.file_path, "/clips/deep/voice.flac");
        assert!(entry.result.is_none());
        assert!(entry.error.as_deref().unwrap_or("").contains("unsupported codec"));
    }

    #[test]
    fn test_generate_picks_format_by_extension() {
        let entries = vec![create_test_entry(Some(Classification::Human), "/a.wav")];
        let dir = std::env::temp_dir();
        let id = std::process::id();
        let json_path = dir.join(format!("voxguard-report-{}.json", id));
        let csv_path = dir.join(format!("voxguard-report-{}.csv", id));

        generate(&json_path, &entries).unwrap();
        generate(&csv_path, &entries).unwrap();
        let json = std::fs::read_to_string(&json_path).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        std::fs::remove_file(&json_path).ok();
        std::fs::remove_file(&csv_path).ok();

        assert!(json.trim_start().starts_with('{'));
        assert!(csv.starts_with("file_path,"));
    }
}
