use serde::Serialize;

use crate::model::Record;

const PASSING_GRADES: &[&str] = &["A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-"];

/// The fixed marks-range histogram used on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksRange {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_students: usize,
    pub pass_count: usize,
    pub pass_rate: f64,
    pub average_grade_points: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_mark: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_mark: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_mark: Option<f64>,
    pub marks_ranges: Vec<MarksRange>,
}

fn round1(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

fn round2(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

// The final mark a record is judged by: the recomputed value when present,
// else the reported one.
fn effective_mark(r: &Record) -> Option<f64> {
    r.computed_final_mark
        .map(|v| v as f64)
        .or(r.reported_final_mark)
}

const RANGE_LABELS: &[(&str, f64)] = &[
    ("90-100", 90.0),
    ("80-89", 80.0),
    ("70-79", 70.0),
    ("60-69", 60.0),
    ("50-59", 50.0),
    ("40-49", 40.0),
];

/// Cohort summary over a classified record set. Zero records yields zeroed
/// stats rather than a division error.
pub fn summarize(records: &[Record]) -> SummaryStats {
    let total_students = records.len();
    let pass_count = records
        .iter()
        .filter(|r| PASSING_GRADES.contains(&r.grade.as_str()))
        .count();
    let pass_rate = if total_students > 0 {
        round1(pass_count as f64 / total_students as f64 * 100.0)
    } else {
        0.0
    };
    let average_grade_points = if total_students > 0 {
        round2(records.iter().map(|r| r.grade_point).sum::<f64>() / total_students as f64)
    } else {
        0.0
    };

    let marks: Vec<f64> = records.iter().filter_map(effective_mark).collect();
    let average_mark = if marks.is_empty() {
        None
    } else {
        Some(round1(marks.iter().sum::<f64>() / marks.len() as f64))
    };
    let highest_mark = marks.iter().copied().fold(None, |acc: Option<f64>, m| {
        Some(acc.map_or(m, |a| a.max(m)))
    });
    let lowest_mark = marks.iter().copied().fold(None, |acc: Option<f64>, m| {
        Some(acc.map_or(m, |a| a.min(m)))
    });

    let mut range_counts = vec![0usize; RANGE_LABELS.len() + 1];
    for m in &marks {
        let slot = RANGE_LABELS
            .iter()
            .position(|(_, lower)| *m >= *lower)
            .unwrap_or(RANGE_LABELS.len());
        range_counts[slot] += 1;
    }
    let marks_ranges = RANGE_LABELS
        .iter()
        .map(|(label, _)| label.to_string())
        .chain(std::iter::once("Below 40".to_string()))
        .zip(range_counts)
        .map(|(label, count)| MarksRange { label, count })
        .collect();

    SummaryStats {
        total_students,
        pass_count,
        pass_rate,
        average_grade_points,
        average_mark,
        highest_mark,
        lowest_mark,
        marks_ranges,
    }
}
