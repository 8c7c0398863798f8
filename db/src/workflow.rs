//! Grade submission workflow: draft -> submitted -> approved -> published,
//! with rejection sending the sheet back to the teacher.
//!
//! Status changes run as compare-and-set updates inside a transaction, so a
//! concurrent reviewer loses the race cleanly instead of double-applying an
//! action. Every accepted event also appends a `workflow_logs` row in the
//! same transaction.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::info;

use crate::error::{DomainError, MissingGrade};
use crate::grading;
use crate::models::grade_submission::Status;
use crate::models::{
    enrollment, grade_component, grade_submission, student, student_grade, user, workflow_log,
};

/// An action a caller can attempt on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum WorkflowEvent {
    Submit,
    Approve,
    Reject,
    Publish,
}

/// The full transition table. Anything not listed here is rejected with
/// `InvalidTransition`; `Published` has no outgoing edges.
pub fn next_status(from: Status, event: WorkflowEvent) -> Result<Status, DomainError> {
    match (from, event) {
        (Status::Draft | Status::Rejected, WorkflowEvent::Submit) => Ok(Status::Submitted),
        (Status::Submitted, WorkflowEvent::Approve) => Ok(Status::Approved),
        (Status::Submitted, WorkflowEvent::Reject) => Ok(Status::Rejected),
        (Status::Approved, WorkflowEvent::Publish) => Ok(Status::Published),
        _ => Err(DomainError::InvalidTransition { from, event }),
    }
}

/// The submission record for an offering, creating a draft (and logging
/// `start`) on first touch.
pub async fn get_or_create(
    db: &DatabaseConnection,
    offering_id: i64,
    actor_id: i64,
) -> Result<grade_submission::Model, DomainError> {
    if let Some(existing) = grade_submission::Entity::find()
        .filter(grade_submission::Column::OfferingId.eq(offering_id))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let txn = db.begin().await?;
    let now = Utc::now();
    let submission = grade_submission::ActiveModel {
        offering_id: Set(offering_id),
        status: Set(Status::Draft),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    append_log(&txn, submission.id, workflow_log::Action::Start, actor_id, None).await?;
    txn.commit().await?;

    info!(offering_id, submission_id = submission.id, "grade submission started");
    Ok(submission)
}

/// Teacher hands the sheet over for review.
///
/// Gated on a valid grade structure and a score for every active enrollment
/// on every component. A submit out of `Rejected` is logged as `resubmit`.
pub async fn submit(
    db: &DatabaseConnection,
    offering_id: i64,
    actor_id: i64,
) -> Result<grade_submission::Model, DomainError> {
    let submission = get_or_create(db, offering_id, actor_id).await?;
    let from = submission.status;
    next_status(from, WorkflowEvent::Submit)?;

    let components = components_for(db, offering_id).await?;
    grading::validate_structure(&components)?;

    let missing = missing_grades(db, offering_id, &components).await?;
    if !missing.is_empty() {
        return Err(DomainError::IncompleteGrades(missing));
    }

    let action = if from == Status::Rejected {
        workflow_log::Action::Resubmit
    } else {
        workflow_log::Action::Submit
    };

    let txn = db.begin().await?;
    advance(&txn, submission.id, from, Status::Submitted).await?;
    append_log(&txn, submission.id, action, actor_id, None).await?;
    txn.commit().await?;

    info!(offering_id, submission_id = submission.id, %action, "grades submitted for review");
    reload(db, submission.id).await
}

/// Administrator accepts a submitted sheet.
pub async fn approve(
    db: &DatabaseConnection,
    submission_id: i64,
    actor: &user::Model,
    notes: Option<String>,
) -> Result<grade_submission::Model, DomainError> {
    let submission = require_reviewer(db, submission_id, actor).await?;
    next_status(submission.status, WorkflowEvent::Approve)?;

    let txn = db.begin().await?;
    advance(&txn, submission.id, Status::Submitted, Status::Approved).await?;
    append_log(&txn, submission.id, workflow_log::Action::Approve, actor.id, notes).await?;
    txn.commit().await?;

    info!(submission_id, actor_id = actor.id, "grade submission approved");
    reload(db, submission_id).await
}

/// Administrator sends a submitted sheet back. Notes are mandatory so the
/// teacher knows what to fix; nothing is written when they are missing.
pub async fn reject(
    db: &DatabaseConnection,
    submission_id: i64,
    actor: &user::Model,
    notes: &str,
) -> Result<grade_submission::Model, DomainError> {
    if notes.trim().is_empty() {
        return Err(DomainError::Validation("Rejection notes are required".into()));
    }

    let submission = require_reviewer(db, submission_id, actor).await?;
    next_status(submission.status, WorkflowEvent::Reject)?;

    let txn = db.begin().await?;
    advance(&txn, submission.id, Status::Submitted, Status::Rejected).await?;
    append_log(
        &txn,
        submission.id,
        workflow_log::Action::Reject,
        actor.id,
        Some(notes.trim().to_owned()),
    )
    .await?;
    txn.commit().await?;

    info!(submission_id, actor_id = actor.id, "grade submission rejected");
    reload(db, submission_id).await
}

/// Administrator releases an approved sheet to students. In the same
/// transaction every active enrollment gets its weighted final grade and is
/// marked passed or failed. Published is terminal.
pub async fn publish(
    db: &DatabaseConnection,
    submission_id: i64,
    actor: &user::Model,
) -> Result<grade_submission::Model, DomainError> {
    let submission = require_reviewer(db, submission_id, actor).await?;
    next_status(submission.status, WorkflowEvent::Publish)?;

    let components = components_for(db, submission.offering_id).await?;
    let missing = missing_grades(db, submission.offering_id, &components).await?;
    if !missing.is_empty() {
        // Scores are frozen after submit, so this only fires if rows were
        // tampered with out of band.
        return Err(DomainError::IncompleteGrades(missing));
    }

    let enrollments = active_enrollments(db, submission.offering_id).await?;
    let scores = scores_by_enrollment(db, &enrollments).await?;

    let txn = db.begin().await?;
    advance(&txn, submission.id, Status::Approved, Status::Published).await?;

    let now = Utc::now();
    for enr in &enrollments {
        let empty = HashMap::new();
        let outcome = grading::final_grade(&components, scores.get(&enr.id).unwrap_or(&empty));
        let status = match outcome.status() {
            Some(grading::PassStatus::Passed) => enrollment::Status::Passed,
            _ => enrollment::Status::Failed,
        };
        enrollment::ActiveModel {
            id: Set(enr.id),
            final_grade: Set(Some(outcome.total)),
            status: Set(status),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await?;
    }

    append_log(&txn, submission.id, workflow_log::Action::Publish, actor.id, None).await?;
    txn.commit().await?;

    info!(
        submission_id,
        actor_id = actor.id,
        enrollments = enrollments.len(),
        "grades published"
    );
    reload(db, submission_id).await
}

/// Audit trail for one submission, oldest first.
pub async fn history(
    db: &DatabaseConnection,
    submission_id: i64,
) -> Result<Vec<workflow_log::Model>, DomainError> {
    Ok(workflow_log::Entity::find()
        .filter(workflow_log::Column::SubmissionId.eq(submission_id))
        .order_by_asc(workflow_log::Column::Id)
        .all(db)
        .await?)
}

async fn require_reviewer(
    db: &DatabaseConnection,
    submission_id: i64,
    actor: &user::Model,
) -> Result<grade_submission::Model, DomainError> {
    if actor.role != user::Role::Administrator {
        return Err(DomainError::Forbidden);
    }
    grade_submission::Entity::find_by_id(submission_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound("Grade submission"))
}

async fn reload(
    db: &DatabaseConnection,
    submission_id: i64,
) -> Result<grade_submission::Model, DomainError> {
    grade_submission::Entity::find_by_id(submission_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound("Grade submission"))
}

/// Compare-and-set on the status column. Zero rows affected means someone
/// else moved the submission first.
async fn advance(
    txn: &DatabaseTransaction,
    submission_id: i64,
    from: Status,
    to: Status,
) -> Result<(), DomainError> {
    let result = grade_submission::Entity::update_many()
        .col_expr(grade_submission::Column::Status, Expr::value(to))
        .col_expr(grade_submission::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(grade_submission::Column::Id.eq(submission_id))
        .filter(grade_submission::Column::Status.eq(from))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::Conflict);
    }
    Ok(())
}

async fn append_log(
    txn: &DatabaseTransaction,
    submission_id: i64,
    action: workflow_log::Action,
    actor_id: i64,
    notes: Option<String>,
) -> Result<(), DomainError> {
    workflow_log::ActiveModel {
        submission_id: Set(submission_id),
        action: Set(action),
        actor_id: Set(actor_id),
        notes: Set(notes),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn components_for(
    db: &DatabaseConnection,
    offering_id: i64,
) -> Result<Vec<grade_component::Model>, DomainError> {
    Ok(grade_component::Entity::find()
        .filter(grade_component::Column::OfferingId.eq(offering_id))
        .order_by_asc(grade_component::Column::Ordinal)
        .all(db)
        .await?)
}

async fn active_enrollments(
    db: &DatabaseConnection,
    offering_id: i64,
) -> Result<Vec<enrollment::Model>, DomainError> {
    Ok(enrollment::Entity::find()
        .filter(enrollment::Column::OfferingId.eq(offering_id))
        .filter(enrollment::Column::Status.eq(enrollment::Status::Active))
        .all(db)
        .await?)
}

/// Raw scores grouped by enrollment id, as component id -> score maps.
async fn scores_by_enrollment(
    db: &DatabaseConnection,
    enrollments: &[enrollment::Model],
) -> Result<HashMap<i64, HashMap<i64, f64>>, DomainError> {
    let ids: Vec<i64> = enrollments.iter().map(|e| e.id).collect();
    let mut grouped: HashMap<i64, HashMap<i64, f64>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let rows = student_grade::Entity::find()
        .filter(student_grade::Column::EnrollmentId.is_in(ids))
        .all(db)
        .await?;
    for row in rows {
        grouped
            .entry(row.enrollment_id)
            .or_default()
            .insert(row.component_id, row.score);
    }
    Ok(grouped)
}

/// Every (student, component) pair that still lacks a score, ordered by
/// student code then component ordinal.
async fn missing_grades(
    db: &DatabaseConnection,
    offering_id: i64,
    components: &[grade_component::Model],
) -> Result<Vec<MissingGrade>, DomainError> {
    let enrollments = active_enrollments(db, offering_id).await?;
    let scores = scores_by_enrollment(db, &enrollments).await?;

    let student_ids: Vec<i64> = enrollments.iter().map(|e| e.student_id).collect();
    let codes: HashMap<i64, String> = if student_ids.is_empty() {
        HashMap::new()
    } else {
        student::Entity::find()
            .filter(student::Column::Id.is_in(student_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.code))
            .collect()
    };

    let mut missing = Vec::new();
    for enr in &enrollments {
        let empty = HashMap::new();
        let entered = scores.get(&enr.id).unwrap_or(&empty);
        for component in grading::missing_components(components, entered) {
            missing.push(MissingGrade {
                student_code: codes.get(&enr.student_id).cloned().unwrap_or_default(),
                component_name: component.name.clone(),
            });
        }
    }
    missing.sort_by(|a, b| a.student_code.cmp(&b.student_code));
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use sea_orm::DatabaseConnection;

    use super::*;
    use crate::models::enrollment_period;
    use crate::test_utils::{seed, setup_test_db};

    struct Fixture {
        db: DatabaseConnection,
        admin: user::Model,
        teacher: user::Model,
        offering_id: i64,
        enrollment_id: i64,
        assignments_id: i64,
        exam_id: i64,
    }

    /// One offering with a valid 50/50 structure and a single active
    /// enrollment. Scores are left for each test to fill in.
    async fn fixture() -> Fixture {
        let db = setup_test_db().await;
        let admin = seed::user(&db, "registrar", user::Role::Administrator).await;
        let teacher = seed::user(&db, "prof.ada", user::Role::Teacher).await;
        let (_, profile) = seed::student(&db, "nina", "EST-2026-0001", 7).await;

        let subject = seed::subject(&db, "MAT101", "Calculus I", 1).await;
        let room = seed::classroom(&db, "A-101", 40).await;
        let period = seed::period(&db, "2026-1", enrollment_period::Status::Open).await;
        let offering = seed::offering(&db, subject.id, teacher.id, room.id, period.id, 30).await;
        let enrollment =
            seed::enrollment(&db, profile.id, offering.id, enrollment::Status::Active).await;

        let assignments = seed::component(&db, offering.id, "Assignments", 100.0, 50, 1).await;
        let exam = seed::component(&db, offering.id, "Exam", 100.0, 50, 2).await;

        Fixture {
            db,
            admin,
            teacher,
            offering_id: offering.id,
            enrollment_id: enrollment.id,
            assignments_id: assignments.id,
            exam_id: exam.id,
        }
    }

    async fn submitted_fixture() -> Fixture {
        let f = fixture().await;
        seed::score(&f.db, f.enrollment_id, f.assignments_id, 80.0).await;
        seed::score(&f.db, f.enrollment_id, f.exam_id, 40.0).await;
        submit(&f.db, f.offering_id, f.teacher.id)
            .await
            .expect("submit should succeed");
        f
    }

    #[test]
    fn transition_table_allows_exactly_the_documented_edges() {
        use Status::*;
        use WorkflowEvent::*;

        let statuses = [Draft, Submitted, Approved, Rejected, Published];
        let events = [Submit, Approve, Reject, Publish];
        let allowed = [
            (Draft, Submit, Submitted),
            (Rejected, Submit, Submitted),
            (Submitted, Approve, Approved),
            (Submitted, Reject, Rejected),
            (Approved, Publish, Published),
        ];

        for from in statuses {
            for event in events {
                let expected = allowed
                    .iter()
                    .find(|(f, e, _)| *f == from && *e == event)
                    .map(|(_, _, to)| *to);
                match (next_status(from, event), expected) {
                    (Ok(to), Some(want)) => assert_eq!(to, want),
                    (Err(DomainError::InvalidTransition { .. }), None) => {}
                    (got, want) => panic!("({from:?}, {event:?}) gave {got:?}, wanted {want:?}"),
                }
            }
        }
    }

    #[test]
    fn invalid_transition_message_names_event_and_state() {
        let err = next_status(Status::Published, WorkflowEvent::Submit).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot submit a submission that is published"
        );
    }

    #[tokio::test]
    async fn first_touch_creates_draft_and_logs_start() {
        let f = fixture().await;
        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();
        assert_eq!(submission.status, Status::Draft);

        // Second call returns the same row without logging again.
        let again = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();
        assert_eq!(again.id, submission.id);

        let logs = history(&f.db, submission.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, workflow_log::Action::Start);
    }

    #[tokio::test]
    async fn submit_is_blocked_until_every_score_is_entered() {
        let f = fixture().await;
        seed::score(&f.db, f.enrollment_id, f.assignments_id, 80.0).await;

        let err = submit(&f.db, f.offering_id, f.teacher.id).await.unwrap_err();
        match err {
            DomainError::IncompleteGrades(missing) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].student_code, "EST-2026-0001");
                assert_eq!(missing[0].component_name, "Exam");
            }
            other => panic!("expected IncompleteGrades, got {other:?}"),
        }

        // Entering the last score flips the gate.
        seed::score(&f.db, f.enrollment_id, f.exam_id, 40.0).await;
        let submission = submit(&f.db, f.offering_id, f.teacher.id).await.unwrap();
        assert_eq!(submission.status, Status::Submitted);
    }

    #[tokio::test]
    async fn submit_requires_a_valid_structure() {
        let f = fixture().await;
        // Third component pushes the weight total to 120.
        seed::component(&f.db, f.offering_id, "Project", 100.0, 20, 3).await;
        seed::score(&f.db, f.enrollment_id, f.assignments_id, 80.0).await;
        seed::score(&f.db, f.enrollment_id, f.exam_id, 40.0).await;

        let err = submit(&f.db, f.offering_id, f.teacher.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn approve_requires_a_submitted_sheet() {
        let f = fixture().await;
        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();

        let err = approve(&f.db, submission.id, &f.admin, None).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: Status::Draft,
                event: WorkflowEvent::Approve
            }
        ));
    }

    #[tokio::test]
    async fn non_administrators_cannot_review() {
        let f = submitted_fixture().await;
        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();

        let err = approve(&f.db, submission.id, &f.teacher, None).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn reject_without_notes_writes_nothing() {
        let f = submitted_fixture().await;
        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();
        let logs_before = history(&f.db, submission.id).await.unwrap().len();

        let err = reject(&f.db, submission.id, &f.admin, "   ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let fresh = reload(&f.db, submission.id).await.unwrap();
        assert_eq!(fresh.status, Status::Submitted);
        assert_eq!(history(&f.db, submission.id).await.unwrap().len(), logs_before);
    }

    #[tokio::test]
    async fn rejected_sheet_can_be_corrected_and_resubmitted() {
        let f = submitted_fixture().await;
        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();

        let rejected = reject(&f.db, submission.id, &f.admin, "Exam scores look transposed")
            .await
            .unwrap();
        assert_eq!(rejected.status, Status::Rejected);
        assert!(rejected.status.is_editable());

        let resubmitted = submit(&f.db, f.offering_id, f.teacher.id).await.unwrap();
        assert_eq!(resubmitted.status, Status::Submitted);

        let actions: Vec<_> = history(&f.db, submission.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                workflow_log::Action::Start,
                workflow_log::Action::Submit,
                workflow_log::Action::Reject,
                workflow_log::Action::Resubmit,
            ]
        );

        let reject_log = history(&f.db, submission.id).await.unwrap().remove(2);
        assert_eq!(reject_log.notes.as_deref(), Some("Exam scores look transposed"));
    }

    #[tokio::test]
    async fn stale_status_update_loses_the_race_with_conflict() {
        let f = submitted_fixture().await;
        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();

        // A first reviewer approves; a second acts on the stale Submitted row.
        approve(&f.db, submission.id, &f.admin, None).await.unwrap();

        let txn = f.db.begin().await.unwrap();
        let err = advance(&txn, submission.id, Status::Submitted, Status::Rejected)
            .await
            .unwrap_err();
        txn.rollback().await.unwrap();
        assert!(matches!(err, DomainError::Conflict));

        let fresh = reload(&f.db, submission.id).await.unwrap();
        assert_eq!(fresh.status, Status::Approved);
    }

    #[tokio::test]
    async fn publish_writes_final_grades_and_is_terminal() {
        let f = submitted_fixture().await;
        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();

        approve(&f.db, submission.id, &f.admin, None).await.unwrap();
        let published = publish(&f.db, submission.id, &f.admin).await.unwrap();
        assert_eq!(published.status, Status::Published);

        // 80/100 at 50% plus 40/100 at 50% is exactly 60, which passes.
        let enr = enrollment::Entity::find_by_id(f.enrollment_id)
            .one(&f.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enr.final_grade, Some(60.0));
        assert_eq!(enr.status, enrollment::Status::Passed);

        let err = publish(&f.db, submission.id, &f.admin).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: Status::Published,
                event: WorkflowEvent::Publish
            }
        ));
    }

    #[tokio::test]
    async fn publish_marks_failing_totals_as_failed() {
        let f = fixture().await;
        seed::score(&f.db, f.enrollment_id, f.assignments_id, 40.0).await;
        seed::score(&f.db, f.enrollment_id, f.exam_id, 50.0).await;
        submit(&f.db, f.offering_id, f.teacher.id).await.unwrap();

        let submission = get_or_create(&f.db, f.offering_id, f.teacher.id)
            .await
            .unwrap();
        approve(&f.db, submission.id, &f.admin, None).await.unwrap();
        publish(&f.db, submission.id, &f.admin).await.unwrap();

        let enr = enrollment::Entity::find_by_id(f.enrollment_id)
            .one(&f.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enr.final_grade, Some(45.0));
        assert_eq!(enr.status, enrollment::Status::Failed);
    }
}
