use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::grade::{GRADES, GradeBand, passed};
use crate::analyzers::utility::{pct, round1};
use crate::analyzers::{
    Aggregator, Direction, Share, distinct, distribution, filter_by, group_by, histogram,
    histogram_over,
};
use crate::record::Record;
use crate::stats::{field_is, result_grade, result_percentage};

const PERFORMERS: usize = 5;

/// Selection applied before the results report is computed. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    pub class: Option<String>,
    pub term: Option<String>,
    pub subject: Option<String>,
    pub status: Option<String>,
    /// Case-insensitive substring of the student's name or id.
    pub search: Option<String>,
}

impl ResultFilter {
    /// Normalizes a dropdown value: empty and `all` select everything.
    pub fn selection(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
    }

    pub fn matches(&self, r: &Record) -> bool {
        let equals = |field: &str, wanted: &Option<String>| {
            wanted.as_deref().is_none_or(|w| field_is(r, field, w))
        };

        equals("class", &self.class)
            && equals("term", &self.term)
            && equals("subject", &self.subject)
            && equals("publish_status", &self.status)
            && self.search.as_deref().is_none_or(|needle| {
                let needle = needle.trim().to_lowercase();
                needle.is_empty()
                    || r.display("studentName").to_lowercase().contains(&needle)
                    || r.display("studentId").to_lowercase().contains(&needle)
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradeBands {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d_f: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassPerformance {
    pub class: String,
    pub average: f64,
    pub students: usize,
    pub results: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectPerformance {
    pub subject: String,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermPoint {
    pub term: String,
    pub average: f64,
    pub results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performer {
    pub rank: usize,
    pub student_id: String,
    pub student_name: String,
    pub class: String,
    pub subject: String,
    pub term: String,
    pub percentage: f64,
    pub grade: String,
}

/// Values offered by the class/term/subject dropdowns, from the unfiltered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub classes: Vec<String>,
    pub terms: Vec<String>,
    pub subjects: Vec<String>,
}

/// Termwise results analytics as shown on the principal's results page.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsReport {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub published: usize,
    pub draft: usize,
    pub average_percentage: f64,
    pub pass_percentage: f64,
    pub grade_bands: GradeBands,
    pub grade_distribution: Vec<Share<String>>,
    pub classes: Vec<ClassPerformance>,
    pub subjects: Vec<SubjectPerformance>,
    pub term_trend: Vec<TermPoint>,
    pub top_performers: Vec<Performer>,
    pub bottom_performers: Vec<Performer>,
    pub options: FilterOptions,
}

impl ResultsReport {
    pub fn from_records(records: &[Record], filter: &ResultFilter) -> Self {
        Self::build(records, filter, Aggregator::new())
    }

    /// Builds the report with an explicit missing-value policy.
    /// Rows without a student id or name are dropped before anything is counted.
    pub fn build(records: &[Record], filter: &ResultFilter, agg: Aggregator) -> Self {
        let cleaned = filter_by(records, identifies_student);
        let rows = filter_by(records, |r| identifies_student(r) && filter.matches(r));
        let overall = agg.summarize(&rows, |r: &&Record| result_percentage(r));
        let passing = rows
            .iter()
            .filter(|r| result_percentage(r).is_some_and(passed))
            .count();

        let bands = histogram(&rows, |r| GradeBand::of(&result_grade(r)));
        let band = |b: GradeBand| bands.get(&Some(b)).copied().unwrap_or(0);

        let grades: Vec<String> = GRADES.iter().map(|g| g.to_string()).collect();
        let grade_distribution = distribution(&histogram_over(&rows, |r| result_grade(r), &grades));

        let status = histogram(&rows, |r| r.display("publish_status"));

        Self {
            generated_at: Utc::now(),
            total: rows.len(),
            published: status.get("Published").copied().unwrap_or(0),
            draft: status.get("Draft").copied().unwrap_or(0),
            average_percentage: round1(overall.average),
            pass_percentage: round1(pct(passing, rows.len())),
            grade_bands: GradeBands {
                a: band(GradeBand::A),
                b: band(GradeBand::B),
                c: band(GradeBand::C),
                d_f: band(GradeBand::DF),
            },
            grade_distribution,
            classes: class_performance(&rows, agg),
            subjects: subject_performance(&rows, agg),
            term_trend: term_trend(&rows, agg),
            top_performers: performers(&rows, agg, Direction::Desc),
            bottom_performers: performers(&rows, agg, Direction::Asc),
            options: FilterOptions {
                classes: options(&cleaned, "class"),
                terms: options(&cleaned, "term"),
                subjects: options(&cleaned, "subject"),
            },
        }
    }
}

fn identifies_student(r: &Record) -> bool {
    !r.display("studentId").is_empty() && !r.display("studentName").is_empty()
}

fn options(records: &[&Record], field: &str) -> Vec<String> {
    distinct(records, |r| r.display(field))
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect()
}

fn class_performance(rows: &[&Record], agg: Aggregator) -> Vec<ClassPerformance> {
    group_by(rows, |r| r.display("class"))
        .into_vec()
        .into_iter()
        .map(|(class, members)| {
            let summary = agg.summarize(&members, |r: &&&Record| result_percentage(r));
            let passing = members
                .iter()
                .filter(|r| result_percentage(r).is_some_and(passed))
                .count();
            ClassPerformance {
                class,
                average: round1(summary.average),
                students: distinct(&members, |r| r.display("studentId")).len(),
                results: members.len(),
                passed: passing,
                failed: members.len() - passing,
            }
        })
        .collect()
}

fn subject_performance(rows: &[&Record], agg: Aggregator) -> Vec<SubjectPerformance> {
    let mut subjects: Vec<SubjectPerformance> = agg
        .group_summary(rows, |r| r.display("subject"), |r| result_percentage(r))
        .into_vec()
        .into_iter()
        .map(|(subject, s)| SubjectPerformance {
            subject,
            average: round1(s.average),
            highest: s.highest,
            lowest: s.lowest,
            results: s.count,
        })
        .collect();

    subjects.sort_by(|a, b| b.average.total_cmp(&a.average));
    subjects
}

fn term_trend(rows: &[&Record], agg: Aggregator) -> Vec<TermPoint> {
    agg.group_summary(rows, |r| r.display("term"), |r| result_percentage(r))
        .into_vec()
        .into_iter()
        .map(|(term, s)| TermPoint {
            term,
            average: round1(s.average),
            results: s.count,
        })
        .collect()
}

fn performers(rows: &[&Record], agg: Aggregator, direction: Direction) -> Vec<Performer> {
    agg.ranked(rows, |r| result_percentage(r), PERFORMERS, direction)
        .into_iter()
        .map(|ranked| {
            let r: &Record = ranked.item;
            Performer {
                rank: ranked.rank,
                student_id: r.display("studentId"),
                student_name: r.display("studentName"),
                class: r.display("class"),
                subject: r.display("subject"),
                term: r.display("term"),
                percentage: ranked.value,
                grade: result_grade(r),
            }
        })
        .collect()
}
