//! Error taxonomy shared by the domain engines.
//!
//! Every failure here is per-request: no variant leaves persisted state
//! half-changed, and `Conflict` is the only one a client should retry as-is.

use thiserror::Error;

use crate::models::grade_submission::Status;
use crate::workflow::WorkflowEvent;

/// A (student, component) pair still missing a score.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MissingGrade {
    pub student_code: String,
    pub component_name: String,
}

#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed a structural rule; the message is safe to show verbatim.
    #[error("{0}")]
    Validation(String),

    /// The requested workflow event has no edge from the current state.
    #[error("Cannot {event} a submission that is {from}")]
    InvalidTransition { from: Status, event: WorkflowEvent },

    /// Submit was attempted while scores are still missing.
    #[error("Grades are incomplete: {} missing score(s)", .0.len())]
    IncompleteGrades(Vec<MissingGrade>),

    /// One or more enrollment rules failed; all violated rules are listed.
    #[error("Student is not eligible: {}", .0.join("; "))]
    NotEligible(Vec<String>),

    /// An enrollment for this (student, offering) pair already exists.
    #[error("Already enrolled in this offering")]
    AlreadyEnrolled { enrollment_id: i64 },

    /// Lost a status CAS or quota race; safe to retry.
    #[error("The record was modified concurrently, please retry")]
    Conflict,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not allowed to perform this action")]
    Forbidden,

    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}
