use serde::Serialize;

/// Marks at or above this percentage pass.
pub const PASS_MARK: f64 = 40.0;

/// Every letter grade, best first. Pass this to `histogram_over` to get a
/// distribution with empty grades included.
pub const GRADES: [&str; 7] = ["A+", "A", "B+", "B", "C", "D", "F"];

/// Converts a percentage (0–100) into a letter grade.
///
/// | Range       | Grade |
/// |-------------|-------|
/// | >= 90       | A+    |
/// | >= 80       | A     |
/// | >= 70       | B+    |
/// | >= 60       | B     |
/// | >= 50       | C     |
/// | >= 40       | D     |
/// | < 40        | F     |
pub fn grade(p: f64) -> &'static str {
    match p {
        p if p >= 90.0 => "A+",
        p if p >= 80.0 => "A",
        p if p >= 70.0 => "B+",
        p if p >= 60.0 => "B",
        p if p >= 50.0 => "C",
        p if p >= PASS_MARK => "D",
        _ => "F",
    }
}

pub fn passed(p: f64) -> bool {
    p >= PASS_MARK
}

/// Coarse bands the principal's results page counts grades into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GradeBand {
    A,
    B,
    C,
    #[serde(rename = "D/F")]
    DF,
}

impl GradeBand {
    pub const ALL: [GradeBand; 4] = [GradeBand::A, GradeBand::B, GradeBand::C, GradeBand::DF];

    /// Band for a letter grade; `None` for anything unrecognised.
    pub fn of(letter: &str) -> Option<Self> {
        match letter.trim() {
            "A+" | "A" => Some(GradeBand::A),
            "B+" | "B" => Some(GradeBand::B),
            "C" => Some(GradeBand::C),
            "D" | "F" => Some(GradeBand::DF),
            _ => None,
        }
    }
}
