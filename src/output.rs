//! Output formatting and persistence for reports.
//!
//! Supports pretty-printing, JSON files (optionally gzipped), and CSV append.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use tracing::{debug, info};

use csv::WriterBuilder;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &impl Debug) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes a report to `path` as pretty-printed JSON, gzip-compressed when `gzip` is set.
pub fn write_json(path: &str, report: &impl Serialize, gzip: bool) -> Result<()> {
    let body = serde_json::to_vec_pretty(report)?;
    let mut file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;

    if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        file.write_all(&encoder.finish()?)?;
    } else {
        file.write_all(&body)?;
    }

    info!(path, bytes = body.len(), gzip, "Report written");
    Ok(())
}

/// Appends rows to a CSV file.
///
/// Writes the header row when the file is missing or empty. Nothing is
/// touched when there are no rows.
pub fn append_rows<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        debug!(path, "No CSV rows to append");
        return Ok(());
    }

    let has_content = fs::metadata(path).is_ok_and(|m| m.len() > 0);
    debug!(path, has_content, rows = rows.len(), "Appending CSV rows");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open '{path}'"))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_content) // IMPORTANT when appending
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
