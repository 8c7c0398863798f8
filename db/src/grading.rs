//! Grade structure validation and weighted final-grade math.
//!
//! Everything here is pure: callers load components and scores, and these
//! functions decide validity, totals and pass/fail without touching the
//! database.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::DomainError;
use crate::models::grade_component;

/// Minimum weighted total required to pass, inclusive.
pub const PASS_MARK: f64 = 51.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Passed,
    Failed,
}

/// Weighted total for one enrollment. `complete` is false while any
/// component still lacks a score, in which case `total` is a running
/// partial and carries no verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeOutcome {
    pub total: f64,
    pub complete: bool,
}

impl GradeOutcome {
    /// Pass/fail verdict, only defined once every component is scored.
    pub fn status(&self) -> Option<PassStatus> {
        if !self.complete {
            return None;
        }
        Some(if self.total >= PASS_MARK {
            PassStatus::Passed
        } else {
            PassStatus::Failed
        })
    }
}

/// Checks a proposed grade structure before it is saved.
///
/// A valid structure has at least one component, unique non-empty names,
/// positive maximum scores, per-component weights in 1..=100, and weights
/// that total exactly 100.
pub fn validate_structure(components: &[grade_component::Model]) -> Result<(), DomainError> {
    if components.is_empty() {
        return Err(DomainError::Validation(
            "Grade structure must have at least one component".into(),
        ));
    }

    let mut seen = HashSet::new();
    for component in components {
        let name = component.name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(
                "Component names must not be empty".into(),
            ));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(DomainError::Validation(format!(
                "Duplicate component name '{name}'"
            )));
        }
        if component.max_score <= 0.0 {
            return Err(DomainError::Validation(format!(
                "Component '{name}' must have a positive maximum score"
            )));
        }
        if component.weight_percent < 1 || component.weight_percent > 100 {
            return Err(DomainError::Validation(format!(
                "Component '{name}' weight must be between 1 and 100"
            )));
        }
    }

    // Integer weights, so the total is compared exactly.
    let total: i32 = components.iter().map(|c| c.weight_percent).sum();
    if total != 100 {
        return Err(DomainError::Validation(format!(
            "Component weights must total exactly 100% (got {total}%)"
        )));
    }

    Ok(())
}

/// Weighted final grade for one enrollment. `scores` maps component id to
/// the raw score on that component.
pub fn final_grade(
    components: &[grade_component::Model],
    scores: &HashMap<i64, f64>,
) -> GradeOutcome {
    let mut total = 0.0;
    let mut complete = true;

    for component in components {
        match scores.get(&component.id) {
            Some(score) => {
                total += (score / component.max_score) * component.weight_percent as f64;
            }
            None => complete = false,
        }
    }

    GradeOutcome { total, complete }
}

/// Components of the structure that `scores` has no entry for.
pub fn missing_components<'a>(
    components: &'a [grade_component::Model],
    scores: &HashMap<i64, f64>,
) -> Vec<&'a grade_component::Model> {
    components
        .iter()
        .filter(|c| !scores.contains_key(&c.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: i64, name: &str, max_score: f64, weight_percent: i32) -> grade_component::Model {
        grade_component::Model {
            id,
            offering_id: 1,
            name: name.to_owned(),
            max_score,
            weight_percent,
            ordinal: id as i32,
        }
    }

    fn assert_validation_message(result: Result<(), DomainError>, expected: &str) {
        match result {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, expected),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_structure_summing_to_exactly_100() {
        let components = vec![
            component(1, "Assignments", 100.0, 40),
            component(2, "Exam", 100.0, 60),
        ];
        assert!(validate_structure(&components).is_ok());
    }

    #[test]
    fn rejects_empty_structure() {
        assert_validation_message(
            validate_structure(&[]),
            "Grade structure must have at least one component",
        );
    }

    #[test]
    fn rejects_weights_summing_below_100() {
        let components = vec![
            component(1, "Assignments", 100.0, 40),
            component(2, "Exam", 100.0, 50),
        ];
        assert_validation_message(
            validate_structure(&components),
            "Component weights must total exactly 100% (got 90%)",
        );
    }

    #[test]
    fn rejects_weights_summing_above_100() {
        let components = vec![
            component(1, "Assignments", 100.0, 60),
            component(2, "Exam", 100.0, 60),
        ];
        assert_validation_message(
            validate_structure(&components),
            "Component weights must total exactly 100% (got 120%)",
        );
    }

    #[test]
    fn rejects_zero_weight_component() {
        let components = vec![
            component(1, "Attendance", 100.0, 0),
            component(2, "Exam", 100.0, 100),
        ];
        assert_validation_message(
            validate_structure(&components),
            "Component 'Attendance' weight must be between 1 and 100",
        );
    }

    #[test]
    fn rejects_non_positive_max_score() {
        let components = vec![component(1, "Exam", 0.0, 100)];
        assert_validation_message(
            validate_structure(&components),
            "Component 'Exam' must have a positive maximum score",
        );
    }

    #[test]
    fn rejects_blank_component_name() {
        let components = vec![component(1, "   ", 100.0, 100)];
        assert_validation_message(validate_structure(&components), "Component names must not be empty");
    }

    #[test]
    fn rejects_duplicate_component_names_case_insensitively() {
        let components = vec![
            component(1, "Exam", 100.0, 50),
            component(2, "exam", 100.0, 50),
        ];
        assert_validation_message(
            validate_structure(&components),
            "Duplicate component name 'exam'",
        );
    }

    #[test]
    fn weighted_total_uses_score_over_max_times_weight() {
        // 80/100 at 50% contributes 40; 40/100 at 50% contributes 20.
        let components = vec![
            component(1, "Assignments", 100.0, 50),
            component(2, "Exam", 100.0, 50),
        ];
        let scores = HashMap::from([(1, 80.0), (2, 40.0)]);

        let outcome = final_grade(&components, &scores);
        assert_eq!(outcome.total, 60.0);
        assert!(outcome.complete);
        assert_eq!(outcome.status(), Some(PassStatus::Passed));
    }

    #[test]
    fn total_does_not_depend_on_component_order() {
        let forward = vec![
            component(1, "Assignments", 50.0, 30),
            component(2, "Project", 20.0, 30),
            component(3, "Exam", 100.0, 40),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        let scores = HashMap::from([(1, 35.0), (2, 11.0), (3, 72.5)]);

        assert_eq!(
            final_grade(&forward, &scores).total,
            final_grade(&reversed, &scores).total
        );
    }

    #[test]
    fn pass_mark_is_inclusive() {
        let components = vec![component(1, "Exam", 100.0, 100)];

        let at_mark = final_grade(&components, &HashMap::from([(1, 51.0)]));
        assert_eq!(at_mark.status(), Some(PassStatus::Passed));

        let just_below = final_grade(&components, &HashMap::from([(1, 50.9)]));
        assert_eq!(just_below.status(), Some(PassStatus::Failed));
    }

    #[test]
    fn incomplete_scores_yield_no_verdict() {
        let components = vec![
            component(1, "Assignments", 100.0, 50),
            component(2, "Exam", 100.0, 50),
        ];
        // Only one of two components scored, even with a would-be passing total.
        let scores = HashMap::from([(1, 100.0)]);

        let outcome = final_grade(&components, &scores);
        assert!(!outcome.complete);
        assert_eq!(outcome.status(), None);

        let missing = missing_components(&components, &scores);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "Exam");
    }
}
