use std::collections::HashMap;

use serde::Serialize;

use crate::grade::ClassificationPolicy;
use crate::model::Record;

/// One row of the grade distribution table. The final entry is a synthesized
/// totals row whose percentage is the literal 100.0, never a sum of rounded
/// parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    pub grade: String,
    pub count: usize,
    pub percentage: f64,
}

pub const TOTAL_LABEL: &str = "Total";

/// 1-decimal half-up rounding, `Int(10*x + 0.5) / 10`.
fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// Reduce a classified record set into ordered grade counts and percentages.
///
/// Every canonical grade of the policy appears, zero counts included. Grades
/// outside the canonical list (e.g. placeholders carried over from a source
/// sheet) are appended after the canonical run in first-seen order, so counts
/// always sum to the record total.
pub fn aggregate(records: &[Record], policy: ClassificationPolicy) -> Vec<DistributionEntry> {
    let canonical = policy.canonical_order();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut extras: Vec<&str> = Vec::new();
    for r in records {
        let grade = r.grade.as_str();
        *counts.entry(grade).or_insert(0) += 1;
        if !canonical.contains(&grade) && !extras.contains(&grade) {
            extras.push(grade);
        }
    }

    let total = records.len();
    let percentage = |count: usize| -> f64 {
        if total == 0 {
            0.0
        } else {
            round_off_1_decimal(count as f64 / total as f64 * 100.0)
        }
    };

    let mut entries: Vec<DistributionEntry> = Vec::with_capacity(canonical.len() + extras.len() + 1);
    for grade in canonical.iter().chain(extras.iter()) {
        let count = counts.get(grade).copied().unwrap_or(0);
        entries.push(DistributionEntry {
            grade: grade.to_string(),
            count,
            percentage: percentage(count),
        });
    }
    entries.push(DistributionEntry {
        grade: TOTAL_LABEL.to_string(),
        count: total,
        percentage: 100.0,
    });
    entries
}
