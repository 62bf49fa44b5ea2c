//! Tabular aggregation and grading.
//!
//! Turns flat row sequences into grouped averages, summaries, grade
//! histograms and rankings. Nothing in here performs I/O or returns an
//! error: empty input gives empty output.

pub mod aggregate;
pub mod grade;
pub mod types;
pub mod utility;

pub use aggregate::{
    Aggregator, distinct, distribution, filter_by, group_average, group_by, group_summary,
    histogram, histogram_over, top_n,
};
pub use types::{Direction, Grouped, MissingValues, Ranked, Share, Summary};
