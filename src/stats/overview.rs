use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::utility::{pct, round1};
use crate::analyzers::{Aggregator, Grouped, filter_by, histogram};
use crate::record::Record;
use crate::stats::field_is;

const CLOSED_ALERT_STATUSES: [&str; 2] = ["Resolved", "Completed"];

/// Whether an alert still needs attention.
pub fn alert_is_open(r: &Record) -> bool {
    if let Some(resolved) = r.text("resolved").filter(|v| !v.is_empty()) {
        return !resolved.eq_ignore_ascii_case("true");
    }
    let status = r.display("status");
    !CLOSED_ALERT_STATUSES.contains(&status.as_str())
}

/// NEP-2020 compliance roll-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NepSummary {
    pub metrics: usize,
    /// Mean `compliancePercent` across metrics.
    pub score: f64,
    pub by_status: Grouped<String, usize>,
    pub by_category: Grouped<String, f64>,
}

impl NepSummary {
    pub fn from_records(records: &[Record], agg: Aggregator) -> Self {
        let rows = filter_by(records, |r| !r.display("category").is_empty());
        let compliance = |r: &&Record| r.number("compliancePercent");

        Self {
            metrics: rows.len(),
            score: round1(agg.summarize(&rows, compliance).average),
            by_status: histogram(&rows, |r| r.display("status")),
            by_category: agg
                .group_average(&rows, |r| r.display("category"), compliance)
                .map_values(|_, v| round1(v)),
        }
    }
}

/// Headline figures for the principal's dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SchoolOverview {
    pub generated_at: DateTime<Utc>,
    pub total_students: usize,
    pub total_teachers: usize,
    /// Share of student attendance rows marked `Present`.
    pub attendance_rate: f64,
    pub average_performance: f64,
    pub assessment_count: usize,
    pub active_alerts: usize,
    pub critical_alerts: usize,
    pub alerts_by_severity: Grouped<String, usize>,
    pub class_enrollment: Grouped<String, usize>,
    pub nep: NepSummary,
}

/// The datasets the overview reads. Any of them may be empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct Datasets<'a> {
    pub students: &'a [Record],
    pub teachers: &'a [Record],
    pub attendance: &'a [Record],
    pub assessments: &'a [Record],
    pub alerts: &'a [Record],
    pub nep_compliance: &'a [Record],
}

impl SchoolOverview {
    pub fn from_datasets(data: Datasets<'_>, agg: Aggregator) -> Self {
        let student_marks = filter_by(data.attendance, |r| field_is(r, "type", "student"));
        let present = student_marks
            .iter()
            .filter(|r| field_is(r, "status", "Present"))
            .count();

        let open_alerts = filter_by(data.alerts, alert_is_open);
        let critical = open_alerts
            .iter()
            .filter(|r| field_is(r, "severity", "High"))
            .count();

        Self {
            generated_at: Utc::now(),
            total_students: data.students.len(),
            total_teachers: data.teachers.len(),
            attendance_rate: round1(pct(present, student_marks.len())),
            average_performance: round1(
                agg.summarize(data.assessments, |r| r.number("overall")).average,
            ),
            assessment_count: data.assessments.len(),
            active_alerts: open_alerts.len(),
            critical_alerts: critical,
            alerts_by_severity: histogram(&open_alerts, |r| r.display("severity")),
            class_enrollment: histogram(data.students, class_label),
            nep: NepSummary::from_records(data.nep_compliance, agg),
        }
    }
}

/// `Class <n>` from a student row's `grade` column, falling back to `class`.
fn class_label(r: &Record) -> String {
    let grade = r.display("grade");
    let grade = if grade.is_empty() { r.display("class") } else { grade };
    format!("Class {}", grade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    fn students() -> Vec<Record> {
        vec![
            Record::from_pairs([("id", Value::from("S001")), ("grade", Value::from(10.0))]),
            Record::from_pairs([("id", Value::from("S002")), ("grade", Value::from(10.0))]),
            Record::from_pairs([("id", Value::from("S003")), ("grade", Value::from(9.0))]),
        ]
    }

    fn attendance() -> Vec<Record> {
        vec![
            Record::from_pairs([("id", "S001"), ("type", "student"), ("status", "Present")]),
            Record::from_pairs([("id", "S002"), ("type", "student"), ("status", "Absent")]),
            Record::from_pairs([("id", "S003"), ("type", "student"), ("status", "Late")]),
            Record::from_pairs([("id", "S003"), ("type", "student"), ("status", "Present")]),
            Record::from_pairs([("id", "T001"), ("type", "teacher"), ("status", "Absent")]),
        ]
    }

    fn alerts() -> Vec<Record> {
        vec![
            Record::from_pairs([("alertId", "A1"), ("severity", "High"), ("status", "Open")]),
            Record::from_pairs([("alertId", "A2"), ("severity", "High"), ("status", "Resolved")]),
            Record::from_pairs([("alertId", "A3"), ("severity", "Low"), ("status", "Monitoring")]),
        ]
    }

    fn nep() -> Vec<Record> {
        vec![
            Record::from_pairs([
                ("category", Value::from("Pedagogy")),
                ("status", Value::from("Achieved")),
                ("compliancePercent", Value::from(100.0)),
            ]),
            Record::from_pairs([
                ("category", Value::from("Pedagogy")),
                ("status", Value::from("On Track")),
                ("compliancePercent", Value::from(80.0)),
            ]),
            Record::from_pairs([
                ("category", Value::from("Assessment")),
                ("status", Value::from("On Track")),
                ("compliancePercent", Value::from(60.0)),
            ]),
            Record::from_pairs([("category", ""), ("status", "")]),
        ]
    }

    #[test]
    fn test_overview() {
        let students = students();
        let attendance = attendance();
        let alerts = alerts();
        let nep = nep();
        let assessments = vec![
            Record::from_pairs([("overall", 70.0)]),
            Record::from_pairs([("overall", 90.0)]),
        ];

        let overview = SchoolOverview::from_datasets(
            Datasets {
                students: &students,
                attendance: &attendance,
                assessments: &assessments,
                alerts: &alerts,
                nep_compliance: &nep,
                ..Default::default()
            },
            Aggregator::new(),
        );

        assert_eq!(overview.total_students, 3);
        assert_eq!(overview.total_teachers, 0);
        assert_eq!(overview.attendance_rate, 50.0);
        assert_eq!(overview.average_performance, 80.0);
        assert_eq!(overview.active_alerts, 2);
        assert_eq!(overview.critical_alerts, 1);
        assert_eq!(overview.class_enrollment.get("Class 10"), Some(&2));
        assert_eq!(overview.class_enrollment.get("Class 9"), Some(&1));
        assert_eq!(overview.nep.metrics, 3);
        assert_eq!(overview.nep.score, 80.0);
        assert_eq!(overview.nep.by_status.get("On Track"), Some(&2));
        assert_eq!(overview.nep.by_category.get("Pedagogy"), Some(&90.0));
    }

    #[test]
    fn test_overview_of_nothing() {
        let overview = SchoolOverview::from_datasets(Datasets::default(), Aggregator::new());

        assert_eq!(overview.total_students, 0);
        assert_eq!(overview.attendance_rate, 0.0);
        assert_eq!(overview.average_performance, 0.0);
        assert!(overview.class_enrollment.is_empty());
        assert_eq!(overview.nep, NepSummary::default());
    }

    #[test]
    fn test_alert_is_open_reads_resolved_flag() {
        let r = Record::from_pairs([("resolved", "false"), ("status", "Resolved")]);
        assert!(alert_is_open(&r));
        let r = Record::from_pairs([("resolved", "TRUE")]);
        assert!(!alert_is_open(&r));
    }
}
