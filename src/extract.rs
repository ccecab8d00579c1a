use crate::model::{Metadata, Record};
use crate::sheet::Grid;

// Fixed coordinates of the semester marksheet layout, zero-indexed. Each
// logical student occupies one data row followed by one blank separator row.
const META_COURSE: (usize, usize) = (1, 8);
const META_EXAM: (usize, usize) = (3, 8);
const META_SUBJECT: (usize, usize) = (5, 8);
const FIRST_RECORD_ROW: usize = 12;
const ROW_STRIDE: usize = 2;
const COL_STUDENT_NO: usize = 0;
const COL_REGISTRATION: usize = 1;
const COL_GRADE: usize = 13;

const GRADE_SENTINEL: &str = "N/A";

/// Outcome of classifying one candidate row. Termination and skip policies
/// are decided here, independently of grid iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accept(Record),
    Skip,
    EndOfTable,
}

fn meta_cell(grid: &Grid, coord: (usize, usize), default: &str) -> String {
    let cell = grid.cell(coord.0, coord.1);
    if cell.is_empty() {
        default.to_string()
    } else {
        cell.as_text()
    }
}

pub fn extract_metadata(grid: &Grid) -> Metadata {
    Metadata {
        course: meta_cell(grid, META_COURSE, "Unknown Course"),
        exam: meta_cell(grid, META_EXAM, "Unknown Exam"),
        subject: meta_cell(grid, META_SUBJECT, "Unknown Subject"),
    }
}

fn is_missing_text(s: &str) -> bool {
    s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("nan")
}

/// Classify one candidate row of the stride-2 region.
///
/// An empty student-number or registration cell is the sole end-of-table
/// detector. A student-number cell that fails to parse as a number, or a
/// registration cell holding only missing-value text, skips the row without
/// ending the scan.
pub fn classify_row(grid: &Grid, row: usize) -> RowOutcome {
    let student_cell = grid.cell(row, COL_STUDENT_NO);
    let registration_cell = grid.cell(row, COL_REGISTRATION);

    if student_cell.is_empty() || registration_cell.is_empty() {
        return RowOutcome::EndOfTable;
    }

    // Fractional student numbers are floored and re-rendered as integers.
    let student_label = match student_cell.as_number() {
        Some(n) => format!("{}", n.floor() as i64),
        None => return RowOutcome::Skip,
    };

    let registration_id = registration_cell.as_text();
    if registration_id.is_empty() || is_missing_text(&registration_id) {
        return RowOutcome::Skip;
    }

    let grade_cell = grid.cell(row, COL_GRADE);
    let grade = if grade_cell.is_empty() {
        GRADE_SENTINEL.to_string()
    } else {
        grade_cell.as_text()
    };

    RowOutcome::Accept(Record {
        student_label: Some(student_label),
        registration_id,
        subject_mark: None,
        assessment_mark: None,
        reported_final_mark: None,
        computed_final_mark: None,
        grade_point: crate::grade::grade_points(&grade),
        grade,
    })
}

/// Extract metadata and student records from a semester marksheet grid.
/// Zero surviving records is a hard failure of the whole parse.
pub fn extract_semester(grid: &Grid) -> anyhow::Result<(Metadata, Vec<Record>)> {
    let metadata = extract_metadata(grid);

    let mut records: Vec<Record> = Vec::new();
    let mut row = FIRST_RECORD_ROW;
    while row < grid.row_count() {
        match classify_row(grid, row) {
            RowOutcome::Accept(r) => records.push(r),
            RowOutcome::Skip => {}
            RowOutcome::EndOfTable => break,
        }
        row += ROW_STRIDE;
    }

    if records.is_empty() {
        anyhow::bail!("no valid records found in marksheet");
    }
    Ok((metadata, records))
}
