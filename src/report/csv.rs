//! CSV report: one row per file, feature values as trailing columns

use super::FileReport;
use crate::features::FEATURE_NAMES;
use std::io::{self, Write};

const COLUMNS: [&str; 10] = [
    "file_path",
    "file_name",
    "classification",
    "confidence_score",
    "confidence_category",
    "ai_probability",
    "quality_score",
    "duration_secs",
    "explanation",
    "error",
];

/// Quote a field if it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write<W: Write>(writer: &mut W, entries: &[FileReport]) -> io::Result<()> {
    let header: Vec<&str> = COLUMNS.iter().chain(FEATURE_NAMES.iter()).copied().collect();
    writeln!(writer, "{}", header.join(","))?;

    for e in entries {
        let mut row = vec![escape(&e.file_path), escape(&e.file_name)];
        match &e.result {
            Some(r) => {
                row.push(r.classification.to_string());
                row.push(format!("{:.4}", r.confidence_score));
                row.push(r.confidence_category.to_string());
                row.push(format!("{:.4}", r.p_ai));
                row.push(format!("{:.3}", r.audio_quality.quality_score));
                row.push(format!("{:.2}", r.audio_quality.duration_seconds));
                row.push(escape(&r.explanation));
                row.push(String::new());
                row.extend(r.features.values().iter().map(|v| format!("{:.6}", v)));
            }
            None => {
                row.extend(std::iter::repeat(String::new()).take(COLUMNS.len() - 3));
                row.push(escape(e.error.as_deref().unwrap_or("")));
                row.extend(std::iter::repeat(String::new()).take(FEATURE_NAMES.len()));
            }
        }
        writeln!(writer, "{}", row.join(","))?;
    }

    Ok(())
}
