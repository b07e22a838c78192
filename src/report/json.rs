//! JSON report: summary counts plus every file entry

use super::{FileReport, Summary};
use chrono::Local;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    generated: String,
    summary: Summary,
    total_processed: usize,
    total_failed: usize,
    files: &'a [FileReport],
}

pub fn write<W: Write>(writer: &mut W, entries: &[FileReport]) -> io::Result<()> {
    let summary = Summary::from_entries(entries);
    let batch = summary.batch();
    let report = Report {
        generated: Local::now().to_rfc3339(),
        summary,
        total_processed: batch.total_processed,
        total_failed: batch.total_failed,
        files: entries,
    };

    serde_json::to_writer_pretty(&mut *writer, &report).map_err(io::Error::from)?;
    writeln!(writer)
}
