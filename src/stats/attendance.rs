use serde::Serialize;

use crate::analyzers::utility::{pct, round1};
use crate::analyzers::{filter_by, histogram};
use crate::record::Record;
use crate::stats::field_is;

/// Present/late/absent tallies for a set of attendance rows.
///
/// Late arrivals count as attended, so `rate` is `(present + late) / total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub total: usize,
    pub rate: f64,
    pub present_pct: f64,
    pub late_pct: f64,
    pub absent_pct: f64,
    /// Dates marked absent, in input order.
    pub absent_dates: Vec<String>,
}

impl AttendanceSummary {
    /// Summarizes all rows, optionally narrowed to one person id and/or one
    /// kind (`student` or `teacher`).
    pub fn from_records(records: &[Record], id: Option<&str>, kind: Option<&str>) -> Self {
        let rows = filter_by(records, |r| {
            id.is_none_or(|id| field_is(r, "id", id)) && kind.is_none_or(|k| field_is(r, "type", k))
        });
        Self::from_rows(&rows)
    }

    pub fn from_rows(rows: &[&Record]) -> Self {
        let counts = histogram(rows, |r| r.display("status"));
        let count = |status: &str| counts.get(status).copied().unwrap_or(0);

        let present = count("Present");
        let late = count("Late");
        let absent = count("Absent");
        let total = rows.len();

        Self {
            present,
            late,
            absent,
            total,
            rate: round1(pct(present + late, total)),
            present_pct: round1(pct(present, total)),
            late_pct: round1(pct(late, total)),
            absent_pct: round1(pct(absent, total)),
            absent_dates: rows
                .iter()
                .filter(|r| field_is(r, "status", "Absent"))
                .map(|r| r.display("date"))
                .collect(),
        }
    }
}
