use serde::Serialize;

use crate::analyzers::grade::grade;
use crate::analyzers::utility::round1;
use crate::analyzers::{Aggregator, Direction, Grouped, filter_by};
use crate::record::Record;
use crate::stats::{AttendanceSummary, field_is, result_percentage};

/// Everything the student portal shows about one student.
#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub student_id: String,
    pub student_name: String,
    pub class: String,
    pub overall_percentage: f64,
    pub overall_grade: String,
    pub results: usize,
    pub subject_averages: Grouped<String, f64>,
    pub term_trend: Grouped<String, f64>,
    pub strongest_subject: Option<String>,
    pub weakest_subject: Option<String>,
    /// Mean of each holistic assessment dimension.
    pub assessment_dimensions: Grouped<String, f64>,
    pub attendance: AttendanceSummary,
}

const DIMENSIONS: [&str; 5] = ["cognitive", "creative", "emotional", "physical", "social"];

impl StudentProfile {
    pub fn from_datasets(
        student_id: &str,
        students: &[Record],
        results: &[Record],
        assessments: &[Record],
        attendance: &[Record],
        agg: Aggregator,
    ) -> Self {
        let info = students.iter().find(|r| field_is(r, "id", student_id));
        let own = filter_by(results, |r| field_is(r, "studentId", student_id));
        let own_assessments = filter_by(assessments, |r| field_is(r, "studentId", student_id));

        let pct = |r: &&Record| result_percentage(r);
        let overall = agg.summarize(&own, pct);
        let overall_grade = if overall.count == 0 {
            "N/A".to_string()
        } else {
            grade(overall.average).to_string()
        };

        let subjects = agg.group_average(&own, |r| r.display("subject"), pct);
        let by_subject: Vec<(String, f64)> = subjects.clone().into_vec();
        let extreme = |direction| {
            agg.top_n(&by_subject, |(_, avg)| Some(*avg), 1, direction)
                .first()
                .map(|(subject, _)| subject.clone())
        };

        let mut dimensions = Grouped::new();
        for dimension in DIMENSIONS {
            if !own_assessments.iter().any(|r| r.number(dimension).is_some()) {
                continue;
            }
            let s = agg.summarize(&own_assessments, |r| r.number(dimension));
            dimensions.entry_or_insert_with(dimension.to_string(), || round1(s.average));
        }

        let name = info
            .map(|r| r.display("name"))
            .or_else(|| own.first().map(|r| r.display("studentName")))
            .unwrap_or_default();
        let class = info
            .map(|r| format!("{}{}", r.display("grade"), r.display("section")))
            .or_else(|| own.first().map(|r| r.display("class")))
            .unwrap_or_default();

        Self {
            student_id: student_id.to_string(),
            student_name: name,
            class,
            overall_percentage: round1(overall.average),
            overall_grade,
            results: own.len(),
            strongest_subject: extreme(Direction::Desc),
            weakest_subject: extreme(Direction::Asc),
            subject_averages: subjects.map_values(|_, v| round1(v)),
            term_trend: agg
                .group_average(&own, |r| r.display("term"), pct)
                .map_values(|_, v| round1(v)),
            assessment_dimensions: dimensions,
            attendance: AttendanceSummary::from_records(attendance, Some(student_id), None),
        }
    }
}
