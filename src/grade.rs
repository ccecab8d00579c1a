use serde::{Deserialize, Serialize};

/// Grade-boundary table plus absence sentinel, selected per input layout.
/// The two tables carry different boundaries and different sentinels and are
/// deliberately kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationPolicy {
    /// Continuous percentage scale used by the flexible results layout.
    #[serde(rename = "tableA")]
    TableA,
    /// Semester scale, with "AB" (absent) instead of "N/A" for missing marks.
    #[serde(rename = "tableB")]
    TableB,
}

// Inclusive lower bounds, highest first; first match wins.
const TABLE_A: &[(f64, &str)] = &[
    (85.0, "A+"),
    (70.0, "A"),
    (65.0, "A-"),
    (60.0, "B+"),
    (55.0, "B"),
    (50.0, "B-"),
    (45.0, "C+"),
    (40.0, "C"),
    (35.0, "C-"),
    (30.0, "D+"),
    (25.0, "D"),
    (20.0, "E"),
];

const TABLE_B: &[(f64, &str)] = &[
    (85.0, "A+"),
    (80.0, "A"),
    (75.0, "A-"),
    (70.0, "B+"),
    (65.0, "B"),
    (60.0, "B-"),
    (55.0, "C+"),
    (50.0, "C"),
    (45.0, "C-"),
    (40.0, "D+"),
    (35.0, "D"),
];

impl ClassificationPolicy {
    fn boundaries(self) -> &'static [(f64, &'static str)] {
        match self {
            ClassificationPolicy::TableA => TABLE_A,
            ClassificationPolicy::TableB => TABLE_B,
        }
    }

    /// Grade below every boundary.
    fn floor_grade(self) -> &'static str {
        match self {
            ClassificationPolicy::TableA => "F",
            ClassificationPolicy::TableB => "E",
        }
    }

    pub fn absence_sentinel(self) -> &'static str {
        match self {
            ClassificationPolicy::TableA => "N/A",
            ClassificationPolicy::TableB => "AB",
        }
    }

    /// Canonical grade ordering for distribution reporting: worst to best,
    /// with the semester table's absence sentinel placed first.
    pub fn canonical_order(self) -> Vec<&'static str> {
        let mut order: Vec<&'static str> = match self {
            ClassificationPolicy::TableA => vec!["F"],
            ClassificationPolicy::TableB => vec!["AB", "E"],
        };
        order.extend(self.boundaries().iter().rev().map(|(_, g)| *g));
        order
    }
}

/// Map a mark (or its absence) to a grade label. Pure function.
pub fn classify(mark: Option<f64>, policy: ClassificationPolicy) -> &'static str {
    let Some(mark) = mark else {
        return policy.absence_sentinel();
    };
    for (bound, label) in policy.boundaries() {
        if mark >= *bound {
            return label;
        }
    }
    policy.floor_grade()
}

/// Grade-point value for a grade label (Table A scale). Labels without a
/// mapping, including the absence sentinels, are worth 0.00.
pub fn grade_points(grade: &str) -> f64 {
    match grade {
        "A+" | "A" => 4.00,
        "A-" => 3.70,
        "B+" => 3.30,
        "B" => 3.00,
        "B-" => 2.70,
        "C+" => 2.30,
        "C" => 2.00,
        "C-" => 1.70,
        "D+" => 1.30,
        "D" => 1.00,
        _ => 0.00,
    }
}
