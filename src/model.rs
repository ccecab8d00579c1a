use chrono::Utc;
use serde::Serialize;

use crate::distribution::{self, DistributionEntry};
use crate::extract;
use crate::grade::{self, ClassificationPolicy};
use crate::resolve::{self, Role};
use crate::sheet::{Grid, Table};
use crate::stats::{self, SummaryStats};
use crate::validate::{self, Mismatch};

/// One student's row after ingestion. Built during extraction/resolution,
/// enriched once by the validator and once by the classifier, then read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_label: Option<String>,
    pub registration_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_mark: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_mark: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_final_mark: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_final_mark: Option<i64>,
    pub grade: String,
    pub grade_point: f64,
}

/// Fixed-coordinate metadata from the semester marksheet layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub course: String,
    pub exam: String,
    pub subject: String,
}

/// Everything the host application needs to render one analyzed upload.
/// Renderers treat this as read-only and never re-derive grades.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub policy: ClassificationPolicy,
    pub records: Vec<Record>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub mismatches: Vec<Mismatch>,
    pub distribution: Vec<DistributionEntry>,
    pub stats: SummaryStats,
    pub generated_at: String,
}

fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn mark_at(table: &Table, row: usize, col: Option<usize>) -> Option<f64> {
    col.and_then(|c| table.cell(row, c).as_number())
}

/// Which column feeds the classifier. Fall-through: computed final when both
/// component columns resolved, else the reported final column, else the first
/// header containing "mark" or "score".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarksSource {
    Computed,
    Column(usize),
    None,
}

fn select_marks_source(table: &Table, roles: &resolve::ColumnRoleMap) -> MarksSource {
    if roles.subject_marks.is_some() && roles.assessment_marks.is_some() {
        return MarksSource::Computed;
    }
    if let Some(col) = roles.final_marks {
        return MarksSource::Column(col);
    }
    for (idx, header) in table.headers.iter().enumerate() {
        let lower = header.to_lowercase();
        if lower.contains("mark") || lower.contains("score") {
            return MarksSource::Column(idx);
        }
    }
    MarksSource::None
}

/// Computed final mark for one row: ceiling of subject + assessment, with a
/// single absent component read as 0. Both components absent means the
/// student has no mark at all.
fn computed_final(subject: Option<f64>, assessment: Option<f64>) -> Option<i64> {
    if subject.is_none() && assessment.is_none() {
        return None;
    }
    Some((subject.unwrap_or(0.0) + assessment.unwrap_or(0.0)).ceil() as i64)
}

/// Analyze a labeled table (the "flexible" layout): resolve column roles,
/// cross-check reported finals, classify under `policy`, aggregate.
pub fn analyze_flexible(table: &Table, policy: ClassificationPolicy) -> anyhow::Result<AnalysisModel> {
    let roles = resolve::resolve_roles(&table.headers);
    let report = validate::resolution_report(&roles);
    let mismatches = validate::find_mismatches(table, &roles);
    let marks_source = select_marks_source(table, &roles);

    let mut warnings = report.warnings;
    if marks_source == MarksSource::None {
        warnings.push("no marks column found; grades not assigned".to_string());
    }

    let mut records: Vec<Record> = Vec::new();
    for (row_idx, _) in table.rows.iter().enumerate() {
        let registration_id = roles
            .get(Role::Registration)
            .map(|c| table.cell(row_idx, c).as_text())
            .unwrap_or_default();
        if registration_id.trim().is_empty() {
            continue;
        }

        let student_label = roles
            .get(Role::Student)
            .map(|c| table.cell(row_idx, c).as_text())
            .filter(|s| !s.is_empty());
        let subject_mark = mark_at(table, row_idx, roles.subject_marks);
        let assessment_mark = mark_at(table, row_idx, roles.assessment_marks);
        let reported_final_mark = mark_at(table, row_idx, roles.final_marks);
        let computed_final_mark = match marks_source {
            MarksSource::Computed => computed_final(subject_mark, assessment_mark),
            _ => None,
        };

        let mark = match marks_source {
            MarksSource::Computed => computed_final_mark.map(|v| v as f64),
            MarksSource::Column(c) => table.cell(row_idx, c).as_number(),
            MarksSource::None => None,
        };
        let grade = grade::classify(mark, policy).to_string();
        let grade_point = grade::grade_points(&grade);

        records.push(Record {
            student_label,
            registration_id: registration_id.trim().to_string(),
            subject_mark,
            assessment_mark,
            reported_final_mark,
            computed_final_mark,
            grade,
            grade_point,
        });
    }

    if records.is_empty() {
        anyhow::bail!("no valid records found in input");
    }

    let dist = distribution::aggregate(&records, policy);
    let summary = stats::summarize(&records);

    Ok(AnalysisModel {
        metadata: None,
        policy,
        records,
        errors: report.errors,
        warnings,
        mismatches,
        distribution: dist,
        stats: summary,
        generated_at: now_stamp(),
    })
}

/// Analyze a fixed-layout semester marksheet grid: positional extraction, then
/// aggregation of the reported grades over the semester (Table B) ordering.
pub fn analyze_semester(grid: &Grid) -> anyhow::Result<AnalysisModel> {
    let (metadata, records) = extract::extract_semester(grid)?;
    let policy = ClassificationPolicy::TableB;
    let dist = distribution::aggregate(&records, policy);
    let summary = stats::summarize(&records);

    Ok(AnalysisModel {
        metadata: Some(metadata),
        policy,
        records,
        errors: Vec::new(),
        warnings: Vec::new(),
        mismatches: Vec::new(),
        distribution: dist,
        stats: summary,
        generated_at: now_stamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn table(headers: &[&str], rows: &[&[Cell]]) -> Table {
        Table {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn flexible_pipeline_classifies_and_flags_mismatches() {
        let t = table(
            &[
                "Student",
                "Registration No",
                "Subject Marks",
                "Assessment Marks",
                "Final Marks",
            ],
            &[
                &[text("Alice"), text("REG-001"), num(45.5), num(30.2), num(75.0)],
                &[text("Bob"), text("REG-002"), num(60.0), num(25.0), num(85.0)],
            ],
        );
        let model = analyze_flexible(&t, ClassificationPolicy::TableA).expect("analyze");

        assert_eq!(model.records.len(), 2);
        // ceil(45.5 + 30.2) = 76, reported 75 -> mismatch at sheet row 2.
        assert_eq!(model.mismatches.len(), 1);
        assert_eq!(model.mismatches[0].row, 2);
        assert_eq!(model.mismatches[0].expected, 76);
        assert_eq!(model.mismatches[0].actual, 75.0);
        // Grades come from the computed final, not the reported column.
        assert_eq!(model.records[0].computed_final_mark, Some(76));
        assert_eq!(model.records[0].grade, "A");
        assert_eq!(model.records[1].grade, "A+");
        assert_eq!(model.records[1].grade_point, 4.00);
        assert!(model.errors.is_empty());
    }

    #[test]
    fn rows_without_registration_are_dropped() {
        let t = table(
            &["Student", "Reg No", "Final Marks"],
            &[
                &[text("Alice"), text("REG-001"), num(50.0)],
                &[text("Ghost"), Cell::Empty, num(90.0)],
                &[text("Carol"), text("  "), num(90.0)],
            ],
        );
        let model = analyze_flexible(&t, ClassificationPolicy::TableA).expect("analyze");
        assert_eq!(model.records.len(), 1);
        assert_eq!(model.records[0].registration_id, "REG-001");
    }

    #[test]
    fn empty_table_is_no_valid_records() {
        let t = table(&["Student", "Reg No", "Final Marks"], &[]);
        let e = analyze_flexible(&t, ClassificationPolicy::TableA).unwrap_err();
        assert!(e.to_string().contains("no valid records"));
    }

    #[test]
    fn falls_back_to_reported_final_then_any_mark_header() {
        let t = table(
            &["Student", "Reg No", "Final Marks"],
            &[&[text("Alice"), text("REG-001"), num(62.0)]],
        );
        let model = analyze_flexible(&t, ClassificationPolicy::TableA).expect("analyze");
        assert_eq!(model.records[0].grade, "B+");
        assert!(model.mismatches.is_empty());

        let t = table(
            &["Student", "Reg No", "Exam Score"],
            &[&[text("Alice"), text("REG-001"), num(62.0)]],
        );
        let model = analyze_flexible(&t, ClassificationPolicy::TableA).expect("analyze");
        assert_eq!(model.records[0].grade, "B+");
    }

    #[test]
    fn missing_marks_source_warns_and_uses_absence_sentinel() {
        let t = table(
            &["Student", "Reg No"],
            &[&[text("Alice"), text("REG-001")]],
        );
        let model = analyze_flexible(&t, ClassificationPolicy::TableA).expect("analyze");
        assert_eq!(model.records[0].grade, "N/A");
        assert_eq!(model.records[0].grade_point, 0.0);
        assert!(model
            .warnings
            .iter()
            .any(|w| w.contains("no marks column")));
    }

    #[test]
    fn both_components_absent_is_absent_not_zero() {
        let t = table(
            &["Reg No", "Subject Marks", "Assessment Marks"],
            &[
                &[text("REG-001"), Cell::Empty, Cell::Empty],
                &[text("REG-002"), num(20.0), Cell::Empty],
            ],
        );
        let model = analyze_flexible(&t, ClassificationPolicy::TableB).expect("analyze");
        assert_eq!(model.records[0].grade, "AB");
        // Single absent component reads as 0: ceil(20 + 0) = 20 -> E.
        assert_eq!(model.records[1].computed_final_mark, Some(20));
        assert_eq!(model.records[1].grade, "E");
    }
}
