use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use engine_logging::engine_info;
use redact_core::ReportSnapshot;
use redact_engine::{report_filename, AtomicFileWriter, PiiMatch, PiiSummaryPayload};
use serde::Serialize;

use super::effects::{match_from_span, summary_payload};

#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    file_id: &'a str,
    pii_matches: Vec<PiiMatch>,
    pii_summary: PiiSummaryPayload,
    processing_timestamp: String,
    original_text_length: usize,
}

/// Write the selected spans and their summary as pretty JSON.
pub(crate) fn write_report(
    writer: &AtomicFileWriter,
    snapshot: &ReportSnapshot,
    now: DateTime<Utc>,
) -> anyhow::Result<PathBuf> {
    let report = ReportFile {
        file_id: &snapshot.document_id,
        pii_matches: snapshot.spans.iter().map(match_from_span).collect(),
        pii_summary: summary_payload(&snapshot.summary),
        processing_timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        original_text_length: snapshot.original_text_length,
    };
    let content = serde_json::to_vec_pretty(&report).context("serialize report")?;
    let filename = report_filename(
        &snapshot.document_id,
        &now.format("%Y-%m-%d").to_string(),
    );
    let path = writer
        .write(&filename, &content)
        .with_context(|| format!("write report to {}", writer.dir().display()))?;
    engine_info!(
        "Exported {} span(s) for document {}",
        report.pii_matches.len(),
        snapshot.document_id
    );
    Ok(path)
}
