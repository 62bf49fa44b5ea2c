//! Dashboard reports built on the aggregator.
//!
//! Each report reads the column names the school's CSV exports use and is
//! assembled only from [`crate::analyzers`] operations.

pub mod attendance;
pub mod overview;
pub mod results;
pub mod student;

pub use attendance::AttendanceSummary;
pub use overview::{NepSummary, SchoolOverview};
pub use results::{ResultFilter, ResultsReport};
pub use student::StudentProfile;

use crate::analyzers::grade::grade;
use crate::record::Record;

/// Percentage of a results row, derived from total/max marks only when the
/// row has no percentage of its own.
pub fn result_percentage(r: &Record) -> Option<f64> {
    r.percentage("percentage", "total_marks", "max_marks")
}

/// Letter grade of a results row: the recorded grade, else the grade of its
/// percentage, else `N/A`.
pub fn result_grade(r: &Record) -> String {
    match r.text("grade").filter(|g| !g.is_empty()) {
        Some(g) => g.to_string(),
        None => result_percentage(r)
            .map(|p| grade(p).to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    }
}

pub(crate) fn field_is(r: &Record, field: &str, wanted: &str) -> bool {
    r.display(field) == wanted
}
