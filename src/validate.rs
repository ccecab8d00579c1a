use serde::Serialize;

use crate::resolve::ColumnRoleMap;
use crate::sheet::{Cell, Table};

/// One row whose reported final mark disagrees with the recomputed value.
/// `row` is 1-based and header-inclusive so it matches the visual position in
/// the original spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub row: usize,
    pub subject_mark: f64,
    pub assessment_mark: f64,
    pub expected: i64,
    pub actual: f64,
}

/// Which required/expected columns resolved. Missing mark columns only
/// disable dependent checks; missing identity columns are reported as errors.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn resolution_report(roles: &ColumnRoleMap) -> ResolutionReport {
    let mut report = ResolutionReport::default();
    if roles.student.is_none() {
        report.errors.push("missing 'Student' or 'Name' column".to_string());
    }
    if roles.registration.is_none() {
        report.errors.push("missing 'Registration' column".to_string());
    }
    if roles.subject_marks.is_none() {
        report.warnings.push("'Subject Marks' column not found".to_string());
    }
    if roles.assessment_marks.is_none() {
        report.warnings.push("'Assessment Marks' column not found".to_string());
    }
    if roles.final_marks.is_none() {
        report.warnings.push("'Final Marks' column not found".to_string());
    }
    report
}

// An absent mark counts as 0 for the expected-final computation; a cell with
// non-numeric text makes the whole row unparseable and excludes it from
// mismatch detection.
fn component(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Empty => Some(0.0),
        other => other.as_number(),
    }
}

/// Cross-check reported final marks against `ceil(subject + assessment)`.
/// Only runs when all three mark roles are resolved; exact comparison, no
/// tolerance.
pub fn find_mismatches(table: &Table, roles: &ColumnRoleMap) -> Vec<Mismatch> {
    let (Some(subject_col), Some(assessment_col), Some(final_col)) =
        (roles.subject_marks, roles.assessment_marks, roles.final_marks)
    else {
        return Vec::new();
    };

    let mut mismatches: Vec<Mismatch> = Vec::new();
    for row_idx in 0..table.rows.len() {
        let Some(subject) = component(table.cell(row_idx, subject_col)) else {
            continue;
        };
        let Some(assessment) = component(table.cell(row_idx, assessment_col)) else {
            continue;
        };
        let Some(actual) = component(table.cell(row_idx, final_col)) else {
            continue;
        };

        let expected = (subject + assessment).ceil() as i64;
        if actual != expected as f64 {
            mismatches.push(Mismatch {
                row: row_idx + 2,
                subject_mark: subject,
                assessment_mark: assessment,
                expected,
                actual,
            });
        }
    }
    mismatches
}
