//! CSV parser for the dashboard datasets.

use anyhow::Result;
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;

use crate::record::{Record, Value};

/// Parses CSV bytes into [`Record`]s keyed by the header row.
///
/// Blank lines and rows whose cells are all empty are skipped. Rows shorter
/// than the header only carry the fields they have; extra cells beyond the
/// header are ignored.
///
/// # Errors
///
/// Returns an error if the header row cannot be read or a row is not valid UTF-8.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();

    for row in rdr.records() {
        let row = row?;
        let fields: BTreeMap<String, Value> = headers
            .iter()
            .zip(row.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, cell)| (name.to_string(), Value::parse(cell)))
            .collect();

        let record = Record::new(fields);
        if record.is_empty() || record.is_blank() {
            continue;
        }
        records.push(record);
    }

    Ok(records)
}
