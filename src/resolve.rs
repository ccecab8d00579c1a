use serde::Serialize;

/// Semantic roles a column can play in the flexible results layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Registration,
    SubjectMarks,
    AssessmentMarks,
    FinalMarks,
}

/// Which source column (by index) fills each role. Built once per input and
/// immutable afterwards; an unresolved role is not an error by itself.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRoleMap {
    pub student: Option<usize>,
    pub registration: Option<usize>,
    pub subject_marks: Option<usize>,
    pub assessment_marks: Option<usize>,
    pub final_marks: Option<usize>,
}

impl ColumnRoleMap {
    fn slot(&mut self, role: Role) -> &mut Option<usize> {
        match role {
            Role::Student => &mut self.student,
            Role::Registration => &mut self.registration,
            Role::SubjectMarks => &mut self.subject_marks,
            Role::AssessmentMarks => &mut self.assessment_marks,
            Role::FinalMarks => &mut self.final_marks,
        }
    }

    pub fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::Student => self.student,
            Role::Registration => self.registration,
            Role::SubjectMarks => self.subject_marks,
            Role::AssessmentMarks => self.assessment_marks,
            Role::FinalMarks => self.final_marks,
        }
    }

    pub fn all_marks_resolved(&self) -> bool {
        self.subject_marks.is_some() && self.assessment_marks.is_some() && self.final_marks.is_some()
    }
}

/// Role predicates in resolution priority order. Each header is tested against
/// this sequence and claims the first role whose predicate matches; a header
/// never fills more than one role, and the first header matching a role wins.
const MATCHERS: &[(Role, fn(&str) -> bool)] = &[
    (Role::Student, |h| h.contains("student") || h.contains("name")),
    (Role::Registration, |h| {
        h.contains("registration") || h.contains("reg")
    }),
    (Role::SubjectMarks, |h| {
        h.contains("subject") && h.contains("mark")
    }),
    (Role::AssessmentMarks, |h| {
        h.contains("assessment") && h.contains("mark")
    }),
    (Role::FinalMarks, |h| h.contains("final") && h.contains("mark")),
];

/// Map column headers to roles by lower-cased substring matching.
pub fn resolve_roles(headers: &[String]) -> ColumnRoleMap {
    let mut map = ColumnRoleMap::default();
    for (idx, header) in headers.iter().enumerate() {
        let lower = header.to_lowercase();
        for (role, pred) in MATCHERS {
            if pred(&lower) {
                let slot = map.slot(*role);
                if slot.is_none() {
                    *slot = Some(idx);
                }
                break;
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(h: &[&str]) -> Vec<String> {
        h.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_standard_headers() {
        let map = resolve_roles(&headers(&[
            "Student Name",
            "Registration No",
            "Subject Marks",
            "Assessment Marks",
            "Final Marks",
        ]));
        assert_eq!(map.student, Some(0));
        assert_eq!(map.registration, Some(1));
        assert_eq!(map.subject_marks, Some(2));
        assert_eq!(map.assessment_marks, Some(3));
        assert_eq!(map.final_marks, Some(4));
    }

    #[test]
    fn first_matching_header_wins_per_role() {
        let map = resolve_roles(&headers(&["Student", "Name", "Reg", "Registration Number"]));
        assert_eq!(map.student, Some(0));
        assert_eq!(map.registration, Some(2));
    }

    #[test]
    fn priority_order_prevents_role_stealing() {
        // "Student Final Marks" contains "student" and matches that role first;
        // the later plain "Final Marks" still resolves the final-marks role.
        let map = resolve_roles(&headers(&["Student Final Marks", "Final Marks"]));
        assert_eq!(map.student, Some(0));
        assert_eq!(map.final_marks, Some(1));
    }

    #[test]
    fn unresolved_roles_stay_absent() {
        let map = resolve_roles(&headers(&["Score", "Remark"]));
        assert_eq!(map.student, None);
        assert_eq!(map.registration, None);
        assert!(!map.all_marks_resolved());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let map = resolve_roles(&headers(&["STUDENT", "REGISTRATION", "SUBJECT MARKS"]));
        assert_eq!(map.student, Some(0));
        assert_eq!(map.registration, Some(1));
        assert_eq!(map.subject_marks, Some(2));
    }
}
